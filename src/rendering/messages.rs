//! # Message Window
//!
//! Queues `print_message` text and lays it out a page at a time. Layout is a
//! pure function of the text and the window size; drawing is done by the
//! display.

use crate::{EventBus, EventKind, GameEvent, SubscriptionId};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Marker shown on the last row while more text is waiting.
pub const MORE_MARKER: &str = "==MORE==";

/// One screenful of message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePage {
    pub rows: Vec<String>,
    /// Whether another page follows this one
    pub more: bool,
}

impl MessagePage {
    /// Rows to draw, with the centred marker appended when `more` is set.
    pub fn lines(&self, width: usize) -> Vec<String> {
        let mut lines = self.rows.clone();
        if self.more {
            lines.push(format!("{:^width$}", MORE_MARKER, width = width));
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Break,
}

fn tokenize(text: &str) -> VecDeque<Token> {
    let mut tokens = VecDeque::new();
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            tokens.push_back(Token::Break);
        }
        tokens.extend(line.split_whitespace().map(|word| Token::Word(word.to_string())));
    }
    tokens
}

fn join(tokens: &VecDeque<Token>) -> String {
    let mut text = String::new();
    let mut after_word = false;
    for token in tokens {
        match token {
            Token::Word(word) => {
                if after_word {
                    text.push(' ');
                }
                text.push_str(word);
                after_word = true;
            }
            Token::Break => {
                text.push('\n');
                after_word = false;
            }
        }
    }
    text
}

/// Lays `text` out in a `width` x `height` window.
///
/// Words wrap at `width`; explicit newlines start a new row. A word longer
/// than a whole row is split, the first part ending in `-`. One row is kept
/// free for the [`MORE_MARKER`], so at most `height - 1` rows are filled.
/// Returns the rows and whatever text did not fit.
///
/// # Examples
///
/// ```
/// use rockslike::layout_message;
///
/// let (rows, rest) = layout_message("You pick up: torch.", 10, 4);
/// assert_eq!(rows, vec!["You pick", "up: torch."]);
/// assert_eq!(rest, None);
/// ```
pub fn layout_message(text: &str, width: usize, height: usize) -> (Vec<String>, Option<String>) {
    let width = width.max(1);
    let max_rows = height.saturating_sub(1).max(1);
    let mut tokens = tokenize(text);
    let mut rows = Vec::new();

    while rows.len() < max_rows && !tokens.is_empty() {
        let mut row = String::new();
        while let Some(token) = tokens.pop_front() {
            let word = match token {
                Token::Break => break,
                Token::Word(word) => word,
            };
            let word_len = word.chars().count();
            let row_len = row.chars().count();

            if row.is_empty() && word_len > width {
                let keep = if width > 1 { width - 1 } else { 1 };
                let head: String = word.chars().take(keep).collect();
                let tail: String = word.chars().skip(keep).collect();
                row = if width > 1 { format!("{}-", head) } else { head };
                tokens.push_front(Token::Word(tail));
                break;
            } else if row.is_empty() {
                row = word;
            } else if row_len + 1 + word_len <= width {
                row.push(' ');
                row.push_str(&word);
            } else {
                tokens.push_front(Token::Word(word));
                break;
            }
        }
        rows.push(row);
    }

    let rest = if tokens.is_empty() {
        None
    } else {
        Some(join(&tokens))
    };
    (rows, rest)
}

/// FIFO of messages published as `print_message`, shown one page at a time.
pub struct MessageWindow {
    queue: Rc<RefCell<VecDeque<String>>>,
    bus: Rc<EventBus>,
    subscription: SubscriptionId,
    /// Text columns
    pub width: usize,
    /// Text rows, marker row included
    pub height: usize,
}

impl std::fmt::Debug for MessageWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageWindow")
            .field("queued", &self.queue.borrow().len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl MessageWindow {
    /// Creates a window that collects every message published on `bus`.
    pub fn new(bus: Rc<EventBus>, width: usize, height: usize) -> Self {
        let queue = Rc::new(RefCell::new(VecDeque::new()));
        let sink = Rc::clone(&queue);
        let subscription = bus.subscribe(EventKind::DisplayMessage, move |event, _| {
            if let GameEvent::DisplayMessage { text } = event {
                sink.borrow_mut().push_back(text.clone());
            }
        });
        Self {
            queue,
            bus,
            subscription,
            width,
            height,
        }
    }

    pub fn add_message(&self, text: impl Into<String>) {
        self.queue.borrow_mut().push_back(text.into());
    }

    /// Number of messages still waiting, a partly shown one included.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn has_messages(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    /// Takes the next page off the queue.
    ///
    /// Text that does not fit goes back to the front of the queue, so a long
    /// message is shown over several pages before the next message starts.
    pub fn next_page(&mut self) -> Option<MessagePage> {
        let mut queue = self.queue.borrow_mut();
        let message = queue.pop_front()?;
        let (rows, rest) = layout_message(&message, self.width, self.height);
        if let Some(rest) = rest {
            queue.push_front(rest);
        }
        Some(MessagePage {
            rows,
            more: !queue.is_empty(),
        })
    }
}

impl Drop for MessageWindow {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription);
    }
}
