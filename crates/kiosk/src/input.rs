//! Visitor text input
//!
//! Lines typed on stdin stand in for the speech-to-text front end: each
//! non-blank line becomes one question for the backend.

use crossbeam_channel::Sender;
use kiosk_control::UtteranceRequest;
use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Forward non-blank lines as questions until input ends or the worker hangs up.
///
/// Returns the number of questions sent.
pub fn forward_questions<R: BufRead>(reader: R, requests: &Sender<UtteranceRequest>) -> usize {
    let mut sent = 0;
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read input: {}", e);
                break;
            }
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        debug!("Visitor asked: {}", question);
        if requests
            .send(UtteranceRequest::Ask(question.to_string()))
            .is_err()
        {
            debug!("Utterance worker gone, stopping input");
            break;
        }
        sent += 1;
    }
    sent
}

/// Read questions from stdin on a background thread
pub fn spawn_stdin_reader(requests: Sender<UtteranceRequest>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("stdin-input".to_string())
        .spawn(move || {
            info!("Type a question and press Enter");
            let stdin = io::stdin();
            let sent = forward_questions(stdin.lock(), &requests);
            info!("Input closed after {} questions", sent);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::io::Cursor;

    #[test]
    fn test_blank_lines_are_skipped() {
        let (tx, rx) = unbounded();
        let input = Cursor::new("where is the library?\n\n   \n  hostel fees  \n");
        assert_eq!(forward_questions(input, &tx), 2);

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                UtteranceRequest::Ask("where is the library?".to_string()),
                UtteranceRequest::Ask("hostel fees".to_string()),
            ]
        );
    }

    #[test]
    fn test_stops_when_worker_gone() {
        let (tx, rx) = unbounded();
        drop(rx);
        let input = Cursor::new("one\ntwo\n");
        assert_eq!(forward_questions(input, &tx), 0);
    }
}
