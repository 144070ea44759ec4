use tracing::debug;

use crate::ai;
use crate::bot::{Data, Error};
use crate::platform::{Button, ChatPlatform, Keyboard, MessageRef, UserId};
use crate::services::economy::{find_item, purchase, CATALOG};
use crate::services::game::{GameSession, MoveOutcome, Phase};
use crate::services::verification;
use crate::utils::formatting::mention_user;

use super::commands::game_rejection;

/// Route a button press by its callback payload. Unknown payloads are
/// ignored; stale buttons on old messages are not worth a user-facing error.
pub async fn handle_button(
    platform: &dyn ChatPlatform,
    data: &Data,
    presser: UserId,
    payload: &str,
    message: MessageRef,
) -> Result<(), Error> {
    if let Some(raw) = payload.strip_prefix("verify_") {
        let target = parse_id(raw)?;
        return verification::tap(platform, &data.verification, presser, target).await;
    }
    if payload == "gomoku_join" {
        return handle_join(platform, data, presser, message).await;
    }
    if let Some(raw) = payload.strip_prefix("gomoku_move_") {
        let (row, col) = parse_coordinates(raw)?;
        return handle_move(platform, data, presser, message, row, col).await;
    }
    if let Some(raw) = payload.strip_prefix("end_") {
        let owner = parse_id(raw)?;
        return ai::handle_end(platform, &data.ai_sessions, message.chat, presser, owner).await;
    }
    if let Some(raw) = payload.strip_prefix("points_") {
        let owner = parse_id(raw)?;
        return handle_points(platform, data, presser, owner, message).await;
    }
    if payload == "shop" {
        return handle_shop(platform, message).await;
    }
    if let Some(item_id) = payload.strip_prefix("buy_") {
        return handle_purchase(platform, data, presser, item_id, message).await;
    }

    debug!(user = presser.0, payload, "ignoring unknown button payload");
    Ok(())
}

fn parse_id(raw: &str) -> Result<UserId, Error> {
    raw.parse()
        .map(UserId)
        .map_err(|_| Error::precondition("This button is expired or invalid."))
}

fn parse_coordinates(raw: &str) -> Result<(usize, usize), Error> {
    let invalid = || Error::precondition("This button is expired or invalid.");
    let (row, col) = raw.split_once('_').ok_or_else(invalid)?;
    Ok((
        row.parse().map_err(|_| invalid())?,
        col.parse().map_err(|_| invalid())?,
    ))
}

async fn handle_join(
    platform: &dyn ChatPlatform,
    data: &Data,
    challenger: UserId,
    message: MessageRef,
) -> Result<(), Error> {
    data.games
        .join(message.chat, challenger, &data.ledger)
        .map_err(game_rejection)?;
    // The lobby message becomes the live board.
    data.games.set_board_message(message.chat, message);
    let session = data
        .games
        .session(message.chat)
        .ok_or_else(|| game_rejection(crate::services::game::GameError::NoSession))?;
    let (text, keyboard) = board_view(&session);
    if let Err(err) = platform.edit_message(message, &text, Some(keyboard)).await {
        // The board never became visible; tear down and refund both stakes.
        let _ = data.games.cancel(message.chat, &data.ledger);
        return Err(Error::Platform(err));
    }
    Ok(())
}

async fn handle_move(
    platform: &dyn ChatPlatform,
    data: &Data,
    player: UserId,
    message: MessageRef,
    row: usize,
    col: usize,
) -> Result<(), Error> {
    let outcome = data
        .games
        .make_move(message.chat, player, row, col, &data.ledger)
        .map_err(game_rejection)?;

    match outcome {
        MoveOutcome::Placed => {
            let session = data
                .games
                .session(message.chat)
                .ok_or_else(|| game_rejection(crate::services::game::GameError::NoSession))?;
            let (text, keyboard) = board_view(&session);
            platform.edit_message(message, &text, Some(keyboard)).await?;
        }
        MoveOutcome::Won { winner, loser, pot } => {
            platform
                .edit_message(
                    message,
                    &format!(
                        "Five in a row! {} beats {} and takes the pot of {pot} points.",
                        mention_user(winner),
                        mention_user(loser)
                    ),
                    None,
                )
                .await?;
        }
        MoveOutcome::Draw { players, refund } => {
            platform
                .edit_message(
                    message,
                    &format!(
                        "The board is full — it's a draw between {} and {}. \
                         Each stake of {refund} points was refunded.",
                        mention_user(players[0]),
                        mention_user(players[1])
                    ),
                    None,
                )
                .await?;
        }
    }
    Ok(())
}

/// Render the live board as a text header plus one tappable button per cell.
fn board_view(session: &GameSession) -> (String, Keyboard) {
    let mut text = format!("Gomoku — stake {} points each.\n", session.stake);
    text.push_str(&format!("● {}", mention_user(session.initiator)));
    if let Some(challenger) = session.challenger {
        text.push_str(&format!(" vs ○ {}", mention_user(challenger)));
    }
    match session.phase {
        Phase::Lobby => text.push_str("\nWaiting for a challenger."),
        Phase::InProgress => {
            if let Some(turn) = session.current_player() {
                text.push_str(&format!("\nIt's {}'s turn.", mention_user(turn)));
            }
        }
    }

    let size = session.board.size();
    let mut keyboard = Vec::with_capacity(size);
    for row in 0..size {
        let mut buttons = Vec::with_capacity(size);
        for col in 0..size {
            buttons.push(Button::new(
                session.board.glyph_at(row, col),
                format!("gomoku_move_{row}_{col}"),
            ));
        }
        keyboard.push(buttons);
    }
    (text, keyboard)
}

async fn handle_points(
    platform: &dyn ChatPlatform,
    data: &Data,
    presser: UserId,
    owner: UserId,
    message: MessageRef,
) -> Result<(), Error> {
    if presser != owner {
        return Err(Error::precondition("This button shows someone else's balance."));
    }
    let record = data.ledger.snapshot(owner);
    let mut text = format!(
        "{} — {} points.\nCheck-in streak: {} day(s), {} total check-ins.",
        mention_user(owner),
        record.points,
        record.check_in_streak,
        record.total_check_ins
    );
    if !record.achievements.is_empty() {
        let mut titles: Vec<&str> = record
            .achievements
            .iter()
            .map(|a| a.title())
            .collect();
        titles.sort_unstable();
        text.push_str(&format!("\nAchievements: {}.", titles.join(", ")));
    }
    platform
        .send_message(
            message.chat,
            &text,
            Some(vec![vec![Button::new("Shop", "shop")]]),
        )
        .await?;
    Ok(())
}

async fn handle_shop(platform: &dyn ChatPlatform, message: MessageRef) -> Result<(), Error> {
    let mut text = String::from("Point shop:\n");
    let mut keyboard: Keyboard = Vec::new();
    for item in CATALOG {
        text.push_str(&format!("• {} — {} points\n", item.name, item.price));
        keyboard.push(vec![Button::new(
            format!("{} ({})", item.name, item.price),
            format!("buy_{}", item.id),
        )]);
    }
    platform
        .send_message(message.chat, text.trim_end(), Some(keyboard))
        .await?;
    Ok(())
}

async fn handle_purchase(
    platform: &dyn ChatPlatform,
    data: &Data,
    buyer: UserId,
    item_id: &str,
    message: MessageRef,
) -> Result<(), Error> {
    let item = find_item(item_id)
        .ok_or_else(|| Error::precondition("That item is no longer available."))?;
    let balance = purchase(&data.ledger, buyer, item_id)
        .map_err(|err| Error::precondition(err.to_string()))?;
    platform
        .send_message(
            message.chat,
            &format!(
                "{} bought {} for {} points. Balance: {balance}.",
                mention_user(buyer),
                item.name,
                item.price
            ),
            None,
        )
        .await?;
    Ok(())
}
