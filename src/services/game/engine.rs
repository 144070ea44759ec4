use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use tracing::info;

use crate::config::Settings;
use crate::platform::{ChatId, MessageRef, UserId};
use crate::services::economy::{Achievement, GameOutcome, GameRecord, Ledger};

use super::board::{Board, Cell, PlaceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    InProgress,
}

/// One wagering game per chat. The two stakes live in escrow: they were
/// debited from the players' balances on open/join and belong to no one
/// until settlement.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub initiator: UserId,
    pub challenger: Option<UserId>,
    pub board: Board,
    /// 0 = initiator (first mover), 1 = challenger
    pub current_turn: usize,
    pub stake: i64,
    pub phase: Phase,
    pub last_move: Option<(usize, usize)>,
    /// The message showing the board, if one has been posted.
    pub board_message: Option<MessageRef>,
}

impl GameSession {
    fn stone_for(slot: usize) -> Cell {
        if slot == 0 {
            Cell::PlayerA
        } else {
            Cell::PlayerB
        }
    }

    fn slot_of(&self, player: UserId) -> Option<usize> {
        if player == self.initiator {
            Some(0)
        } else if self.challenger == Some(player) {
            Some(1)
        } else {
            None
        }
    }

    pub fn current_player(&self) -> Option<UserId> {
        match self.current_turn {
            0 => Some(self.initiator),
            1 => self.challenger,
            _ => None,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GameError {
    #[error("a game is already running in this chat")]
    SessionExists,
    #[error("no open game in this chat")]
    NoSession,
    #[error("the game has already started")]
    NotInLobby,
    #[error("the game has not started yet")]
    NotStarted,
    #[error("stake must be between {min} and {max} points")]
    StakeOutOfRange { min: i64, max: i64 },
    #[error("not enough points for that stake")]
    InsufficientBalance,
    #[error("you opened this game; wait for a challenger")]
    SelfJoin,
    #[error("you are not part of this game")]
    NotAPlayer,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("that position is off the board")]
    OutOfBounds,
    #[error("that cell is already taken")]
    CellOccupied,
}

/// Result of a successful move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Placed,
    Won {
        winner: UserId,
        loser: UserId,
        pot: i64,
    },
    Draw {
        players: [UserId; 2],
        refund: i64,
    },
}

/// All live sessions, keyed by chat. Every operation validates and mutates
/// under the chat's entry lock with no awaits in between, so the
/// check-then-act sequences (session existence, balance, turn) cannot
/// interleave with other events for the same chat.
#[derive(Default)]
pub struct GameHub {
    sessions: DashMap<ChatId, GameSession>,
}

impl GameHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a lobby and move the initiator's stake into escrow.
    pub fn open(
        &self,
        chat: ChatId,
        initiator: UserId,
        stake: i64,
        settings: &Settings,
        ledger: &Ledger,
    ) -> Result<(), GameError> {
        if stake < settings.min_bet || stake > settings.max_bet {
            return Err(GameError::StakeOutOfRange {
                min: settings.min_bet,
                max: settings.max_bet,
            });
        }

        match self.sessions.entry(chat) {
            Entry::Occupied(_) => Err(GameError::SessionExists),
            Entry::Vacant(vacant) => {
                if ledger.try_debit(initiator, stake).is_none() {
                    return Err(GameError::InsufficientBalance);
                }
                vacant.insert(GameSession {
                    initiator,
                    challenger: None,
                    board: Board::new(settings.board_size),
                    current_turn: 0,
                    stake,
                    phase: Phase::Lobby,
                    last_move: None,
                    board_message: None,
                });
                info!(chat = chat.0, user = initiator.0, stake, "gomoku lobby opened");
                Ok(())
            }
        }
    }

    /// Seat a challenger at the session's stake and start the game.
    pub fn join(&self, chat: ChatId, challenger: UserId, ledger: &Ledger) -> Result<i64, GameError> {
        match self.sessions.entry(chat) {
            Entry::Vacant(_) => Err(GameError::NoSession),
            Entry::Occupied(mut occupied) => {
                let session = occupied.get_mut();
                if session.phase != Phase::Lobby || session.challenger.is_some() {
                    return Err(GameError::NotInLobby);
                }
                if challenger == session.initiator {
                    return Err(GameError::SelfJoin);
                }
                if ledger.try_debit(challenger, session.stake).is_none() {
                    return Err(GameError::InsufficientBalance);
                }
                session.challenger = Some(challenger);
                session.phase = Phase::InProgress;
                session.current_turn = 0;
                info!(
                    chat = chat.0,
                    user = challenger.0,
                    stake = session.stake,
                    "gomoku game started"
                );
                Ok(session.stake)
            }
        }
    }

    /// Play one stone. Terminal outcomes settle the escrow and delete the
    /// session; that is the only way a chat's slot is freed on a finished
    /// game.
    pub fn make_move(
        &self,
        chat: ChatId,
        player: UserId,
        row: usize,
        col: usize,
        ledger: &Ledger,
    ) -> Result<MoveOutcome, GameError> {
        match self.sessions.entry(chat) {
            Entry::Vacant(_) => Err(GameError::NoSession),
            Entry::Occupied(mut occupied) => {
                let session = occupied.get_mut();
                if session.phase != Phase::InProgress {
                    return Err(GameError::NotStarted);
                }
                let slot = session.slot_of(player).ok_or(GameError::NotAPlayer)?;
                if slot != session.current_turn {
                    return Err(GameError::NotYourTurn);
                }

                session
                    .board
                    .place(row, col, GameSession::stone_for(slot))
                    .map_err(|e| match e {
                        PlaceError::OutOfBounds => GameError::OutOfBounds,
                        PlaceError::Occupied => GameError::CellOccupied,
                    })?;
                session.last_move = Some((row, col));

                if session.board.wins_at(row, col) {
                    let session = occupied.remove();
                    let loser = if slot == 0 {
                        session.challenger.unwrap_or(session.initiator)
                    } else {
                        session.initiator
                    };
                    let outcome = settle_win(ledger, chat, player, loser, session.stake);
                    return Ok(outcome);
                }

                if session.board.is_full() {
                    let session = occupied.remove();
                    let players = [
                        session.initiator,
                        session.challenger.unwrap_or(session.initiator),
                    ];
                    let outcome = settle_draw(ledger, chat, players, session.stake);
                    return Ok(outcome);
                }

                session.current_turn = 1 - session.current_turn;
                Ok(MoveOutcome::Placed)
            }
        }
    }

    /// Tear down a session, refunding whatever is in escrow. Exposed for the
    /// explicit cancel command; there is no resignation inside a game.
    pub fn cancel(&self, chat: ChatId, ledger: &Ledger) -> Result<Vec<UserId>, GameError> {
        let (_, session) = self.sessions.remove(&chat).ok_or(GameError::NoSession)?;
        let mut refunded = vec![session.initiator];
        ledger.credit(session.initiator, session.stake);
        if let Some(challenger) = session.challenger {
            ledger.credit(challenger, session.stake);
            refunded.push(challenger);
        }
        info!(chat = chat.0, "gomoku session cancelled, escrow refunded");
        Ok(refunded)
    }

    pub fn session(&self, chat: ChatId) -> Option<GameSession> {
        self.sessions.get(&chat).map(|s| s.clone())
    }

    pub fn set_board_message(&self, chat: ChatId, message: MessageRef) {
        if let Some(mut session) = self.sessions.get_mut(&chat) {
            session.board_message = Some(message);
        }
    }
}

fn settle_win(ledger: &Ledger, chat: ChatId, winner: UserId, loser: UserId, stake: i64) -> MoveOutcome {
    let pot = stake * 2;
    ledger.credit(winner, pot);
    let finished_at = Utc::now();
    ledger.record_game(
        winner,
        GameRecord {
            opponent: loser,
            stake,
            outcome: GameOutcome::Win,
            finished_at,
        },
    );
    ledger.record_game(
        loser,
        GameRecord {
            opponent: winner,
            stake,
            outcome: GameOutcome::Loss,
            finished_at,
        },
    );
    ledger.grant_achievement(winner, Achievement::FirstWin);
    info!(chat = chat.0, winner = winner.0, loser = loser.0, pot, "gomoku settled");
    MoveOutcome::Won { winner, loser, pot }
}

fn settle_draw(ledger: &Ledger, chat: ChatId, players: [UserId; 2], stake: i64) -> MoveOutcome {
    let finished_at = Utc::now();
    for (player, opponent) in [(players[0], players[1]), (players[1], players[0])] {
        ledger.credit(player, stake);
        ledger.record_game(
            player,
            GameRecord {
                opponent,
                stake,
                outcome: GameOutcome::Draw,
                finished_at,
            },
        );
    }
    info!(chat = chat.0, stake, "gomoku drawn, stakes returned");
    MoveOutcome::Draw { players, refund: stake }
}
