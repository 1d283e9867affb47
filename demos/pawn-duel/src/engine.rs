//! Pawn Duel: each side races eight pawns across the board.
//!
//! Pawns move and capture exactly as in chess (single step forward,
//! optional double step from the home rank, diagonal captures), minus
//! en passant. The race is won by the first pawn to reach the far rank,
//! or by capturing every enemy pawn. A side with pawns but no legal
//! move is stalemated.

use tempo::prelude::*;

const BOARD: usize = 8;

#[derive(Clone)]
pub struct PawnDuelConfig {
    /// Allow the two-square advance from the home rank.
    pub double_step: bool,
}

impl Default for PawnDuelConfig {
    fn default() -> Self {
        Self { double_step: true }
    }
}

pub struct PawnDuelEngine {
    config: PawnDuelConfig,
    /// `grid[rank][file]`, rank 0 = rank 1 (white's home side).
    grid: BoardGrid,
    turn: Color,
    fullmove: u32,
}

impl RulesEngine for PawnDuelEngine {
    type Config = PawnDuelConfig;

    fn new(config: &PawnDuelConfig) -> Self {
        let mut grid: BoardGrid = vec![vec![None; BOARD]; BOARD];
        for file in 0..BOARD {
            grid[1][file] = Some((PieceKind::Pawn, Color::White));
            grid[6][file] = Some((PieceKind::Pawn, Color::Black));
        }
        Self {
            config: config.clone(),
            grid,
            turn: Color::initial(),
            fullmove: 1,
        }
    }

    fn load_position(&mut self, fen: &str) -> Result<(), EngineError> {
        let mut fields = fen.split_whitespace();
        let placement = fields
            .next()
            .ok_or_else(|| invalid("empty position string"))?;
        let active = fields.next().unwrap_or("w");

        let mut grid: BoardGrid = vec![vec![None; BOARD]; BOARD];
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != BOARD {
            return Err(invalid(format!("expected 8 ranks, got {}", ranks.len())));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = BOARD - 1 - i;
            let mut file = 0;
            for c in rank_str.chars() {
                match c {
                    '1'..='8' => {
                        file += c as usize - '0' as usize;
                    }
                    'P' => {
                        if file >= BOARD {
                            return Err(invalid(format!("rank {rank_str} overflows")));
                        }
                        grid[rank][file] = Some((PieceKind::Pawn, Color::White));
                        file += 1;
                    }
                    'p' => {
                        if file >= BOARD {
                            return Err(invalid(format!("rank {rank_str} overflows")));
                        }
                        grid[rank][file] = Some((PieceKind::Pawn, Color::Black));
                        file += 1;
                    }
                    other => {
                        return Err(invalid(format!(
                            "only pawns are allowed, found '{other}'"
                        )));
                    }
                }
            }
            if file != BOARD {
                return Err(invalid(format!("rank {rank_str} has {file} files")));
            }
        }

        let turn = match active {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(invalid(format!("bad active color '{other}'"))),
        };
        let fullmove = fields
            .nth(3)
            .and_then(|f| f.parse().ok())
            .unwrap_or(1);

        self.grid = grid;
        self.turn = turn;
        self.fullmove = fullmove;
        Ok(())
    }

    fn fen(&self) -> String {
        let mut out = String::new();
        for rank in (0..BOARD).rev() {
            let mut empty = 0;
            for file in 0..BOARD {
                match self.grid[rank][file] {
                    None => empty += 1,
                    Some((_, color)) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(match color {
                            Color::White => 'P',
                            Color::Black => 'p',
                        });
                    }
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }
        // No castling or en passant in this variant, and every move is a
        // pawn move so the halfmove clock is always zero.
        format!(
            "{} {} - - 0 {}",
            out,
            self.turn.role(),
            self.fullmove
        )
    }

    fn board_grid(&self) -> BoardGrid {
        self.grid.clone()
    }

    fn apply_move(&mut self, mv: &MoveCandidate) -> Result<AppliedMove, EngineError> {
        let (fr, ff) = parse_square(&mv.from)?;
        let (tr, tf) = parse_square(&mv.to)?;

        let Some((_, color)) = self.grid[fr][ff] else {
            return Err(EngineError::Illegal(format!("{} is empty", mv.from)));
        };
        if color != self.turn {
            return Err(EngineError::Illegal(format!(
                "{} is not a {} pawn",
                mv.from, self.turn
            )));
        }

        let dir: isize = match color {
            Color::White => 1,
            Color::Black => -1,
        };
        let home_rank: usize = match color {
            Color::White => 1,
            Color::Black => 6,
        };
        let step = tr as isize - fr as isize;

        let captured = if tf == ff {
            if self.grid[tr][tf].is_some() {
                return Err(EngineError::Illegal(format!("{} is blocked", mv.to)));
            }
            let double_ok = self.config.double_step
                && fr == home_rank
                && step == 2 * dir
                && self.grid[(fr as isize + dir) as usize][ff].is_none();
            if step != dir && !double_ok {
                return Err(EngineError::Illegal(format!(
                    "a pawn cannot go from {} to {}",
                    mv.from, mv.to
                )));
            }
            false
        } else if ff.abs_diff(tf) == 1 && step == dir {
            match self.grid[tr][tf] {
                Some((_, occupant)) if occupant != color => true,
                _ => {
                    return Err(EngineError::Illegal(format!(
                        "no capture available on {}",
                        mv.to
                    )));
                }
            }
        } else {
            return Err(EngineError::Illegal(format!(
                "a pawn cannot go from {} to {}",
                mv.from, mv.to
            )));
        };

        // All checks passed; mutate.
        self.grid[tr][tf] = self.grid[fr][ff].take();
        if self.turn == Color::Black {
            self.fullmove += 1;
        }
        self.turn = self.turn.opposite();

        let san = if captured {
            format!("{}x{}", &mv.from[..1], mv.to)
        } else {
            mv.to.clone()
        };
        Ok(AppliedMove {
            from: mv.from.clone(),
            to: mv.to.clone(),
            promotion: None,
            san: Some(san),
        })
    }

    fn current_mover(&self) -> Color {
        self.turn
    }

    fn is_checkmate(&self) -> bool {
        self.race_won() || self.pawns(self.turn) == 0
    }

    fn is_stalemate(&self) -> bool {
        !self.race_won()
            && self.pawns(self.turn) > 0
            && !self.has_legal_move(self.turn)
    }

    fn has_insufficient_material(&self) -> bool {
        false
    }

    fn is_threefold_repetition(&self) -> bool {
        // Pawns only ever advance, so a position can never recur.
        false
    }

    fn half_move_clock(&self) -> u32 {
        0
    }
}

impl PawnDuelEngine {
    /// Whether either side already has a pawn on its far rank.
    fn race_won(&self) -> bool {
        self.grid[BOARD - 1]
            .iter()
            .any(|sq| matches!(sq, Some((_, Color::White))))
            || self.grid[0]
                .iter()
                .any(|sq| matches!(sq, Some((_, Color::Black))))
    }

    fn pawns(&self, color: Color) -> usize {
        self.grid
            .iter()
            .flatten()
            .filter(|sq| matches!(sq, Some((_, c)) if *c == color))
            .count()
    }

    fn has_legal_move(&self, color: Color) -> bool {
        let dir: isize = match color {
            Color::White => 1,
            Color::Black => -1,
        };
        for rank in 0..BOARD {
            for file in 0..BOARD {
                if !matches!(self.grid[rank][file], Some((_, c)) if c == color) {
                    continue;
                }
                let ahead = rank as isize + dir;
                if !(0..BOARD as isize).contains(&ahead) {
                    continue;
                }
                let ahead = ahead as usize;
                if self.grid[ahead][file].is_none() {
                    return true;
                }
                for side in [file.wrapping_sub(1), file + 1] {
                    if side < BOARD
                        && matches!(
                            self.grid[ahead][side],
                            Some((_, c)) if c != color
                        )
                    {
                        return true;
                    }
                }
            }
        }
        false
    }
}

fn parse_square(s: &str) -> Result<(usize, usize), EngineError> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return Err(EngineError::Illegal(format!("malformed square '{s}'")));
    }
    let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a') as usize;
    let rank = bytes[1].wrapping_sub(b'1') as usize;
    if file >= BOARD || rank >= BOARD {
        return Err(EngineError::Illegal(format!("'{s}' is off the board")));
    }
    Ok((rank, file))
}

fn invalid(msg: impl Into<String>) -> EngineError {
    EngineError::InvalidPosition(msg.into())
}

// =========================================================================
// Tests
// =========================================================================
