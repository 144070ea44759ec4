use chrono::Local;
use tracing::debug;

use crate::bot::{Data, Error};
use crate::platform::{Button, ChatId, ChatPlatform, MessageRef, UserId};
use crate::services::economy::{self, CheckInError};
use crate::services::game::GameError;
use crate::services::moderation::{self, WarningOutcome};
use crate::services::verification;
use crate::utils::duration::{format_duration, parse_duration};
use crate::utils::formatting::mention_user;

use std::time::Duration;

use crate::constants::defaults::{DEFAULT_CLEAN_COUNT, DEFAULT_GOMOKU_STAKE, MAX_CLEAN_COUNT};

/// Parsed command surface. Moderation commands are authorization-gated in
/// the handler; `Sign` and `Gomoku` are open to everyone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Warn(UserId),
    Unwarn(UserId),
    Ban(UserId),
    Mute(UserId),
    Unmute(UserId),
    Tmute(UserId, Duration),
    Del(u64),
    Clean(u32),
    Verify(UserId),
    Sign,
    GomokuOpen(i64),
    GomokuCancel,
}

/// Parse a message into a command. `Ok(None)` means the text is not a
/// recognized command and should flow on to the AI proxy; `Err` is a
/// user-visible usage rejection.
pub fn parse(text: &str) -> Result<Option<Command>, Error> {
    let text = text.trim();
    if !text.starts_with('/') {
        return Ok(None);
    }
    let mut parts = text[1..].split_whitespace();
    let name = match parts.next() {
        Some(name) => name,
        None => return Ok(None),
    };
    let args: Vec<&str> = parts.collect();

    let command = match name {
        "warn" => Command::Warn(require_user(&args, 0, "/warn <user>")?),
        "unwarn" => Command::Unwarn(require_user(&args, 0, "/unwarn <user>")?),
        "ban" => Command::Ban(require_user(&args, 0, "/ban <user>")?),
        "mute" => Command::Mute(require_user(&args, 0, "/mute <user>")?),
        "unmute" => Command::Unmute(require_user(&args, 0, "/unmute <user>")?),
        "tmute" => {
            let user = require_user(&args, 0, "/tmute <user> <duration>")?;
            let raw = args
                .get(1)
                .ok_or_else(|| Error::precondition("Usage: /tmute <user> <duration>"))?;
            let duration = parse_duration(raw).ok_or_else(|| {
                Error::precondition("Invalid duration — use forms like 30s, 5m, 1h, 1d.")
            })?;
            Command::Tmute(user, duration)
        }
        "del" => {
            let id = args
                .first()
                .and_then(|a| a.parse().ok())
                .ok_or_else(|| Error::precondition("Usage: /del <message id>"))?;
            Command::Del(id)
        }
        "clean" => {
            let count = match args.first() {
                Some(raw) => raw
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| Error::precondition("Usage: /clean [count]"))?,
                None => DEFAULT_CLEAN_COUNT,
            };
            if count > MAX_CLEAN_COUNT {
                return Err(Error::precondition(format!(
                    "At most {MAX_CLEAN_COUNT} messages can be cleaned at once."
                )));
            }
            Command::Clean(count)
        }
        "verify" => Command::Verify(require_user(&args, 0, "/verify <user>")?),
        "sign" => Command::Sign,
        "gomoku" => match args.first() {
            Some(&"cancel") => Command::GomokuCancel,
            Some(raw) => {
                let stake = raw
                    .parse()
                    .map_err(|_| Error::precondition("Usage: /gomoku [stake]"))?;
                Command::GomokuOpen(stake)
            }
            None => Command::GomokuOpen(DEFAULT_GOMOKU_STAKE),
        },
        _ => return Ok(None),
    };
    Ok(Some(command))
}

fn require_user(args: &[&str], index: usize, usage: &str) -> Result<UserId, Error> {
    args.get(index)
        .and_then(|raw| parse_user(raw))
        .ok_or_else(|| Error::precondition(format!("Usage: {usage}")))
}

/// Accepts a bare numeric id or a `<@id>` mention.
fn parse_user(raw: &str) -> Option<UserId> {
    let raw = raw
        .strip_prefix("<@")
        .and_then(|r| r.strip_suffix('>'))
        .unwrap_or(raw);
    raw.parse().ok().map(UserId)
}

/// Execute a parsed command. Moderation commands re-check the sender's role
/// at execution time; the role lives on the platform and may have changed.
pub async fn handle_command(
    platform: &dyn ChatPlatform,
    data: &Data,
    chat: ChatId,
    sender: UserId,
    message: MessageRef,
    command: Command,
) -> Result<(), Error> {
    if command_is_gated(&command) {
        let role = platform.member_role(chat, sender).await?;
        if !role.is_admin() {
            return Err(Error::denied(
                "Only chat admins can use this command.".to_string(),
            ));
        }
    }

    debug!(chat = chat.0, sender = sender.0, ?command, "command accepted");

    match command {
        Command::Warn(target) => {
            let outcome =
                moderation::add_warning(platform, &data.ledger, &data.settings, chat, target)
                    .await?;
            let notice = match outcome {
                WarningOutcome::Warned { count, max } => format!(
                    "{} has been warned ({count}/{max}).",
                    mention_user(target)
                ),
                WarningOutcome::Banned => format!(
                    "{} reached the warning limit and was banned.",
                    mention_user(target)
                ),
            };
            platform.send_message(chat, &notice, None).await?;
        }
        Command::Unwarn(target) => {
            let count = moderation::remove_warning(&data.ledger, target);
            platform
                .send_message(
                    chat,
                    &format!(
                        "Removed one warning from {} ({count}/{}).",
                        mention_user(target),
                        data.settings.max_warnings
                    ),
                    None,
                )
                .await?;
        }
        Command::Ban(target) => {
            platform.ban_member(chat, target).await?;
            data.ledger.clear_warnings(target);
            platform
                .send_message(chat, &format!("{} was banned.", mention_user(target)), None)
                .await?;
        }
        Command::Mute(target) => {
            let duration = data.settings.default_mute;
            moderation::mute_user(platform, chat, target, duration).await?;
            platform
                .send_message(
                    chat,
                    &format!(
                        "{} was muted for {}.",
                        mention_user(target),
                        format_duration(duration)
                    ),
                    None,
                )
                .await?;
        }
        Command::Unmute(target) => {
            moderation::unmute_user(platform, chat, target).await?;
            platform
                .send_message(chat, &format!("{} was unmuted.", mention_user(target)), None)
                .await?;
        }
        Command::Tmute(target, duration) => {
            moderation::mute_user(platform, chat, target, duration).await?;
            platform
                .send_message(
                    chat,
                    &format!(
                        "{} was muted for {}.",
                        mention_user(target),
                        format_duration(duration)
                    ),
                    None,
                )
                .await?;
        }
        Command::Del(message_id) => {
            platform
                .delete_message(MessageRef { chat, message_id })
                .await?;
            // the command itself goes too
            let _ = platform.delete_message(message).await;
        }
        Command::Clean(count) => {
            // Walk message ids backwards from the command. Gaps and already
            // deleted ids are skipped silently, as the platform allows.
            let mut deleted = 0;
            for offset in 1..=u64::from(count) {
                let Some(message_id) = message.message_id.checked_sub(offset) else {
                    break;
                };
                if platform
                    .delete_message(MessageRef { chat, message_id })
                    .await
                    .is_ok()
                {
                    deleted += 1;
                }
            }
            let _ = platform.delete_message(message).await;
            platform
                .send_message(chat, &format!("Cleaned {deleted} messages."), None)
                .await?;
        }
        Command::Verify(target) => {
            verification::approve(platform, &data.verification, chat, target).await?;
            platform
                .send_message(
                    chat,
                    &format!("{} was verified manually.", mention_user(target)),
                    None,
                )
                .await?;
        }
        Command::Sign => {
            let roll = economy::roll_daily(&data.settings);
            let today = Local::now().date_naive();
            match economy::check_in(&data.ledger, &data.settings, sender, today, roll) {
                Ok(outcome) => {
                    let mut notice = format!(
                        "{} checked in! +{} points (base {}",
                        mention_user(sender),
                        outcome.reward(),
                        outcome.base
                    );
                    if outcome.streak_bonus > 0 {
                        notice.push_str(&format!(", streak bonus {}", outcome.streak_bonus));
                    }
                    if outcome.milestone_bonus > 0 {
                        notice.push_str(&format!(", milestone bonus {}", outcome.milestone_bonus));
                    }
                    notice.push_str(&format!(
                        ").\nStreak: {} day(s) · total check-ins: {} · balance: {}",
                        outcome.streak, outcome.total_check_ins, outcome.balance
                    ));
                    for achievement in &outcome.new_achievements {
                        notice.push_str(&format!("\nAchievement unlocked: {}!", achievement.title()));
                    }
                    platform
                        .send_message(
                            chat,
                            &notice,
                            Some(vec![vec![
                                Button::new("My points", format!("points_{}", sender.0)),
                                Button::new("Shop", "shop"),
                            ]]),
                        )
                        .await?;
                }
                Err(CheckInError::AlreadyCheckedIn) => {
                    return Err(Error::precondition(
                        "You already checked in today — come back tomorrow!",
                    ));
                }
            }
        }
        Command::GomokuOpen(stake) => {
            data.games
                .open(chat, sender, stake, &data.settings, &data.ledger)
                .map_err(game_rejection)?;
            let lobby = platform
                .send_message(
                    chat,
                    &format!(
                        "{} opened a gomoku game with a {stake} point stake. \
                         Tap to join — winner takes the pot!",
                        mention_user(sender)
                    ),
                    Some(vec![vec![Button::new("Join game", "gomoku_join")]]),
                )
                .await
                .map_err(|err| {
                    // The lobby never became visible; give the stake back.
                    let _ = data.games.cancel(chat, &data.ledger);
                    Error::Platform(err)
                })?;
            data.games.set_board_message(chat, lobby);
        }
        Command::GomokuCancel => {
            let session = data
                .games
                .session(chat)
                .ok_or_else(|| game_rejection(GameError::NoSession))?;
            if session.initiator != sender {
                let role = platform.member_role(chat, sender).await?;
                if !role.is_admin() {
                    return Err(Error::denied(
                        "Only the game's initiator or an admin can cancel it.",
                    ));
                }
            }
            data.games
                .cancel(chat, &data.ledger)
                .map_err(game_rejection)?;
            platform
                .send_message(chat, "Game cancelled, stakes refunded.", None)
                .await?;
        }
    }

    Ok(())
}

fn command_is_gated(command: &Command) -> bool {
    !matches!(
        command,
        Command::Sign | Command::GomokuOpen(_) | Command::GomokuCancel
    )
}

pub(crate) fn game_rejection(err: GameError) -> Error {
    Error::precondition(err.to_string())
}
