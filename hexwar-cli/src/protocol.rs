//! Driver protocol client: a blocking TCP line client against a match
//! server, per §4.9/§6. Knows nothing about the engine's internals beyond
//! its public façade (`search`, `best_move`, `play_move`, `set_gamestate`).

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use hexwar_core::{Cell, Player};
use hexwar_mcts::{BestMove, MctsConfig, RolloutPolicy, SearchEngine};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame from driver: {0:?}")]
    Framing(String),

    #[error("i/o error talking to driver: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Colour {
    Red,
    Blue,
}

impl Colour {
    fn flip(self) -> Self {
        match self {
            Colour::Red => Colour::Blue,
            Colour::Blue => Colour::Red,
        }
    }

    fn as_player(self) -> Player {
        match self {
            Colour::Red => Player::Red,
            Colour::Blue => Player::Blue,
        }
    }

    fn parse(s: &str) -> Result<Self, ProtocolError> {
        match s {
            "R" => Ok(Colour::Red),
            "B" => Ok(Colour::Blue),
            other => Err(ProtocolError::Framing(format!("unknown colour {other:?}"))),
        }
    }
}

/// Parses a `<r>,<c>` cell token as sent/received on the wire.
fn parse_cell(s: &str) -> Result<Cell, ProtocolError> {
    let (r, c) = s
        .split_once(',')
        .ok_or_else(|| ProtocolError::Framing(format!("bad cell token {s:?}")))?;
    let row: u8 = r.parse().map_err(|_| ProtocolError::Framing(format!("bad row in {s:?}")))?;
    let col: u8 = c.parse().map_err(|_| ProtocolError::Framing(format!("bad col in {s:?}")))?;
    Ok(Cell::new(row, col))
}

/// The hard-coded Red opening move (policy, not engine; §9).
const OPENING_MOVE: Cell = Cell::new(1, 3);

/// A single driver session: one TCP connection, one engine, one colour.
/// Generic over the rollout policy so the same client drives both the
/// plain RAVE engine and the LGR variant (`-variant rave|lgr` in `main`).
pub struct DriverClient<P: RolloutPolicy + Default> {
    stream: TcpStream,
    engine: SearchEngine<P>,
    colour: Colour,
    time_budget: Duration,
    has_played_opening: bool,
}

impl<P: RolloutPolicy + Default> DriverClient<P> {
    pub fn connect(addr: &str, config: MctsConfig, time_budget: Duration) -> Result<Self, ProtocolError> {
        let stream = TcpStream::connect(addr)?;
        Ok(Self {
            stream,
            engine: SearchEngine::new(config),
            colour: Colour::Red,
            time_budget,
            has_played_opening: false,
        })
    }

    /// Run the read loop until `END`/connection close. Returns `Ok(())` on
    /// clean shutdown, `Err` on a framing fault (connection-fatal per §7).
    pub fn run(&mut self) -> Result<(), ProtocolError> {
        let reader = BufReader::new(self.stream.try_clone()?);
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            if !self.handle_line(&line)? {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Dispatches one newline-delimited line. Returns `Ok(false)` when the
    /// session should end (`END`), `Ok(true)` to keep reading.
    fn handle_line(&mut self, line: &str) -> Result<bool, ProtocolError> {
        let fields: Vec<&str> = line.split(';').collect();
        if fields.first() == Some(&"END") || (fields.first() == Some(&"CHANGE") && fields.last() == Some(&"END")) {
            tracing::info!("END");
            return Ok(false);
        }
        match fields.as_slice() {
            ["START", size, colour] => {
                let board_size: u8 = size
                    .parse()
                    .map_err(|_| ProtocolError::Framing(format!("bad board size {size:?}")))?;
                self.colour = Colour::parse(colour)?;
                let config = MctsConfig { board_size, ..MctsConfig::default() };
                self.engine = SearchEngine::new(config);
                tracing::info!(board_size, colour = ?self.colour, "START");

                if self.colour == Colour::Red {
                    self.engine.play_move(OPENING_MOVE)?;
                    self.has_played_opening = true;
                    self.send_move(OPENING_MOVE)?;
                }
                Ok(true)
            }
            ["CHANGE", "SWAP", _board, whose_turn] => {
                self.colour = self.colour.flip();
                tracing::info!(new_colour = ?self.colour, "CHANGE SWAP");
                if self.is_my_turn(whose_turn)? {
                    self.search_and_reply()?;
                }
                Ok(true)
            }
            ["CHANGE", cell, _board, whose_turn] => {
                let mv = parse_cell(cell)?;
                tracing::info!(?mv, "CHANGE");
                self.engine.play_move(mv)?;
                if self.is_my_turn(whose_turn)? {
                    self.search_and_reply()?;
                }
                Ok(true)
            }
            other => Err(ProtocolError::Framing(format!("{other:?}"))),
        }
    }

    fn is_my_turn(&self, whose_turn: &str) -> Result<bool, ProtocolError> {
        Ok(Colour::parse(whose_turn)?.as_player() == self.colour.as_player())
    }

    /// Always-swap policy for Blue's first reply (§9); otherwise search and
    /// send the best move.
    fn search_and_reply(&mut self) -> Result<(), ProtocolError> {
        if self.colour == Colour::Blue && !self.has_played_opening {
            self.has_played_opening = true;
            tracing::info!("swapping (always-swap policy)");
            self.send_swap()?;
            return Ok(());
        }
        self.has_played_opening = true;

        self.engine.search(self.time_budget);
        let stats = self.engine.statistics();
        tracing::info!(rollouts = stats.rollouts, tree_size = stats.tree_size, elapsed = ?stats.elapsed, "search");

        match self.engine.best_move() {
            BestMove::Move(mv) => {
                self.engine.play_move(mv)?;
                self.send_move(mv)?;
            }
            BestMove::GameOver => tracing::info!("root already decided, nothing to send"),
        }
        Ok(())
    }

    fn send_move(&mut self, mv: Cell) -> Result<(), ProtocolError> {
        tracing::info!(?mv, "sending move");
        writeln!(self.stream, "{},{}", mv.row, mv.col)?;
        Ok(())
    }

    fn send_swap(&mut self) -> Result<(), ProtocolError> {
        writeln!(self.stream, "SWAP")?;
        Ok(())
    }
}

impl From<hexwar_core::HexError> for ProtocolError {
    fn from(e: hexwar_core::HexError) -> Self {
        ProtocolError::Framing(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_accepts_row_comma_col() {
        assert_eq!(parse_cell("4,7").unwrap(), Cell::new(4, 7));
    }

    #[test]
    fn test_parse_cell_rejects_missing_comma() {
        assert!(parse_cell("47").is_err());
    }

    #[test]
    fn test_colour_parse_rejects_unknown_token() {
        assert!(Colour::parse("G").is_err());
    }

    #[test]
    fn test_colour_flip_round_trips() {
        assert_eq!(Colour::Red.flip().flip(), Colour::Red);
    }

    #[test]
    fn test_red_opens_with_hardcoded_move_then_shuts_down_on_end() {
        use std::io::BufRead;
        use std::net::TcpListener;
        use std::thread;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            writeln!(socket, "START;5;R").unwrap();

            let mut reader = BufReader::new(socket.try_clone().unwrap());
            let mut first_move = String::new();
            reader.read_line(&mut first_move).unwrap();

            writeln!(socket, "END").unwrap();
            first_move.trim().to_string()
        });

        let config = MctsConfig { board_size: 5, time_budget: Duration::from_millis(50), ..MctsConfig::default() };
        let mut client = DriverClient::connect(&addr, config, config.time_budget).unwrap();
        client.run().expect("clean shutdown on END");

        assert_eq!(server.join().unwrap(), "1,3");
    }

    #[test]
    fn test_garbage_frame_is_a_framing_error() {
        use std::net::TcpListener;
        use std::thread;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            writeln!(socket, "NOT_A_REAL_FRAME").unwrap();
        });

        let config = MctsConfig { board_size: 5, time_budget: Duration::from_millis(50), ..MctsConfig::default() };
        let mut client = DriverClient::connect(&addr, config, config.time_budget).unwrap();
        assert!(matches!(client.run(), Err(ProtocolError::Framing(_))));

        server.join().unwrap();
    }
}
