use crossbeam_channel::{unbounded, Receiver, Sender};
use horizon_core::InputEvent;
use log::{debug, warn};
use std::io::{self, BufRead};
use std::thread;

/// Read JSON-lines input events from stdin on a background thread.
///
/// The thread ends at EOF or once the receiving side is dropped.
pub fn spawn_stdin_reader() -> io::Result<Receiver<InputEvent>> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("input-reader".to_string())
        .spawn(move || read_events(io::stdin().lock(), &tx))?;
    Ok(rx)
}

pub fn read_events<R: BufRead>(reader: R, tx: &Sender<InputEvent>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Input stream failed: {}", e);
                break;
            }
        };
        let Some(event) = parse_line(&line) else { continue };
        if tx.send(event).is_err() {
            break;
        }
    }
    debug!("Input reader finished");
}

fn parse_line(line: &str) -> Option<InputEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Ignoring malformed input event {:?}: {}", line, e);
            None
        }
    }
}
