//! The collection of statuses a document set is configured to recognise.

use crate::status::{Status, StatusConfiguration, StatusType};
use icu_collator::options::CollatorOptions;
use icu_collator::preferences::CollationNumericOrdering;
use icu_collator::{Collator, CollatorBorrowed, CollatorPreferences};
use icu_provider::DataError;
use tracing::{debug, warn};

/// Registered statuses, unique by symbol, in insertion order.
///
/// There is no process-wide instance: the caller owns a registry and passes
/// it to whatever needs it. Every traversal is bounded by the number of
/// registered statuses, so cyclic `next_status_symbol` chains are safe.
#[derive(Debug, Clone)]
pub struct StatusRegistry {
    statuses: Vec<Status>,
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRegistry {
    /// Create a registry holding the default statuses.
    pub fn new() -> Self {
        let mut registry = Self {
            statuses: Vec::new(),
        };
        registry.add_default_statuses();
        registry
    }

    /// Replace the contents with `statuses`, in order. Duplicate symbols are ignored.
    pub fn set<I, S>(&mut self, statuses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Status>,
    {
        self.clear_statuses();
        for status in statuses {
            self.add(status);
        }
    }

    /// All registered statuses except the EMPTY one.
    pub fn registered_statuses(&self) -> Vec<&Status> {
        let empty_symbol = Status::empty();
        self.statuses
            .iter()
            .filter(|s| s.symbol() != empty_symbol.symbol())
            .collect()
    }

    /// Register a status unless its symbol is already known.
    /// Returns true if it was added.
    pub fn add(&mut self, status: impl Into<Status>) -> bool {
        let status = status.into();
        if self.has_symbol(status.symbol()) {
            debug!(symbol = status.symbol(), "status symbol already registered, ignoring");
            return false;
        }
        self.statuses.push(status);
        true
    }

    /// The registered status for `symbol`, or EMPTY.
    pub fn by_symbol(&self, symbol: &str) -> Status {
        self.find(symbol).cloned().unwrap_or_else(Status::empty)
    }

    /// The registered status for `symbol`, or a new Unknown status keeping
    /// the symbol. The new status is not registered.
    pub fn by_symbol_or_create(&self, symbol: &str) -> Status {
        self.find(symbol)
            .cloned()
            .unwrap_or_else(|| Status::unknown(symbol))
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.find(symbol).is_some()
    }

    pub fn reset_to_default_statuses(&mut self) {
        self.clear_statuses();
        self.add_default_statuses();
    }

    pub fn clear_statuses(&mut self) {
        self.statuses.clear();
    }

    /// Follow one `next_status_symbol` hop. EMPTY if the target is not registered.
    pub fn get_next_status(&self, status: &Status) -> Status {
        if status.next_status_symbol().is_empty() {
            return Status::empty();
        }
        self.by_symbol(status.next_status_symbol())
    }

    /// Like [`StatusRegistry::get_next_status`], but an unregistered target
    /// becomes an Unknown TODO status with the requested symbol, so toggling
    /// always produces something usable.
    pub fn get_next_status_or_create(&self, status: &Status) -> Status {
        let next = self.get_next_status(status);
        if next.status_type() != StatusType::Empty {
            return next;
        }
        Status::unknown(status.next_status_symbol())
    }

    /// The status for the new instance of a recurring task that has just
    /// moved to `done_status`.
    ///
    /// Walks forward from the next status looking for TODO, then for
    /// IN_PROGRESS. If neither is reachable, uses the status for `' '`, so the
    /// new instance is still found by "not done" searches.
    pub fn get_next_recurrence_status_or_create(&self, done_status: &Status) -> Status {
        let next = self.get_next_status_or_create(done_status);

        if let Some(found) = self.search_forward_for_type(&next, StatusType::Todo) {
            return found;
        }
        if let Some(found) = self.search_forward_for_type(&next, StatusType::InProgress) {
            return found;
        }
        self.by_symbol_or_create(" ")
    }

    fn search_forward_for_type(&self, start: &Status, wanted: StatusType) -> Option<Status> {
        if start.status_type() == wanted {
            return Some(start.clone());
        }
        let max_hops = self.registered_statuses().len().saturating_sub(1);
        let mut current = start.clone();
        for _ in 0..max_hops {
            current = self.get_next_status_or_create(&current);
            if current.status_type() == wanted {
                return Some(current);
            }
        }
        None
    }

    /// Statuses seen in the wild whose symbols are not registered here.
    ///
    /// One entry per symbol (first occurrence wins), named `Unknown (<symbol>)`,
    /// sorted by symbol with numbers compared by value.
    pub fn find_unknown_statuses(&self, all_statuses: &[Status]) -> Vec<Status> {
        let mut unknown: Vec<Status> = Vec::new();
        for status in all_statuses {
            if self.has_symbol(status.symbol()) {
                continue;
            }
            if unknown.iter().any(|u| u.symbol() == status.symbol()) {
                continue;
            }
            unknown.push(status.with_name(&format!("Unknown ({})", status.symbol())));
        }
        sort_by_symbol(&mut unknown);
        unknown
    }

    /// Render the registered statuses and their transitions as a mermaid flowchart.
    ///
    /// Next-status symbols that are not registered are left out. DONE
    /// statuses get an extra dotted edge when recurrence would move a new
    /// instance somewhere other than their configured next status.
    pub fn mermaid_diagram(&self, include_details: bool) -> String {
        let statuses = self.registered_statuses();

        let mut nodes: Vec<String> = Vec::new();
        let mut edges: Vec<String> = Vec::new();
        for (index, status) in statuses.iter().enumerate() {
            nodes.push(format!(
                "{}{}",
                index + 1,
                mermaid_node_label(status, include_details)
            ));

            let next = self.get_next_status(status);
            push_edge(&statuses, &next, &mut edges, index, false);

            if status.status_type() == StatusType::Done {
                let next_recurring = self.get_next_recurrence_status_or_create(status);
                if next_recurring.symbol() != next.symbol() {
                    push_edge(&statuses, &next_recurring, &mut edges, index, true);
                }
            }
        }

        format!(
            "
```mermaid
flowchart LR

classDef TODO        stroke:#f33,stroke-width:3px;
classDef DONE        stroke:#0c0,stroke-width:3px;
classDef IN_PROGRESS stroke:#fa0,stroke-width:3px;
classDef CANCELLED   stroke:#ddd,stroke-width:3px;
classDef NON_TASK    stroke:#99e,stroke-width:3px;

{}
{}

linkStyle default stroke:gray
```
",
            nodes.join("\n"),
            edges.join("\n")
        )
    }

    fn find(&self, symbol: &str) -> Option<&Status> {
        self.statuses.iter().find(|s| s.symbol() == symbol)
    }

    fn add_default_statuses(&mut self) {
        for status in [
            Status::todo(),
            Status::in_progress(),
            Status::done(),
            Status::cancelled(),
        ] {
            self.add(status);
        }
    }
}

impl From<Vec<StatusConfiguration>> for StatusRegistry {
    fn from(configurations: Vec<StatusConfiguration>) -> Self {
        let mut registry = StatusRegistry::new();
        registry.set(configurations);
        registry
    }
}

fn push_edge(
    statuses: &[&Status],
    next: &Status,
    edges: &mut Vec<String>,
    index: usize,
    recurrence_override: bool,
) {
    if next.status_type() == StatusType::Empty {
        return;
    }
    let Some(next_index) = statuses.iter().position(|s| s.symbol() == next.symbol()) else {
        return;
    };
    let joiner = if recurrence_override {
        "-. \"🔁\" .-> "
    } else {
        " --> "
    };
    edges.push(format!("{}{}{}", index + 1, joiner, next_index + 1));
}

fn mermaid_node_label(status: &Status, include_details: bool) -> String {
    let name = html_encode(status.name());
    let status_type = status.status_type();
    if include_details {
        format!(
            "[\"'{}'<br>[{}] -> [{}]<br>({})\"]:::{}",
            name,
            html_encode(status.symbol()),
            html_encode(status.next_status_symbol()),
            status_type,
            status_type
        )
    } else {
        format!("[\"{}\"]:::{}", name, status_type)
    }
}

/// Encode the characters mermaid cannot take literally inside a label.
pub fn html_encode(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '&' => encoded.push_str("&amp;"),
            '"' => encoded.push_str("&quot;"),
            _ => encoded.push(c),
        }
    }
    encoded
}

/// Collator for ordering status symbols: punctuation and symbols before
/// digits before letters, runs of digits by numeric value, lowercase first.
pub fn symbol_collator() -> Result<CollatorBorrowed<'static>, DataError> {
    let mut prefs = CollatorPreferences::default();
    prefs.numeric_ordering = Some(CollationNumericOrdering::True);
    Collator::try_new(prefs, CollatorOptions::default())
}

fn sort_by_symbol(statuses: &mut [Status]) {
    match symbol_collator() {
        Ok(collator) => statuses.sort_by(|a, b| collator.compare(a.symbol(), b.symbol())),
        Err(e) => {
            warn!("collation data unavailable, sorting symbols by code point: {}", e);
            statuses.sort_by(|a, b| a.symbol().cmp(b.symbol()));
        }
    }
}
