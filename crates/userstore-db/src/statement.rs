//! SQL statement classification and script splitting.
//!
//! The session needs to know, before running a statement, whether it reads,
//! mutates, changes the schema, or tries to control the transaction itself.
//! Classification looks only at the leading keyword.

/// What a statement does to the session's transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Returns rows (`SELECT`, `WITH`, `VALUES`, `PRAGMA`, `EXPLAIN`).
    Query,
    /// Changes rows (`INSERT`, `UPDATE`, `DELETE`, `REPLACE`).
    Mutation,
    /// Changes the schema (`CREATE`, `ALTER`, `DROP`).
    Schema,
    /// `COMMIT` or `END`.
    Commit,
    /// `ROLLBACK`.
    Rollback,
    /// `BEGIN`, `SAVEPOINT`, `RELEASE`; the session owns transactions.
    Unsupported,
    /// Anything else (`VACUUM`, `ATTACH`, `ANALYZE`, ...), executed as-is.
    Other,
}

impl StatementKind {
    /// Classify a statement by its first keyword.
    pub fn classify(sql: &str) -> Self {
        let keyword = leading_keyword(sql).to_ascii_uppercase();
        match keyword.as_str() {
            "SELECT" | "WITH" | "VALUES" | "PRAGMA" | "EXPLAIN" => Self::Query,
            "INSERT" | "UPDATE" | "DELETE" | "REPLACE" => Self::Mutation,
            "CREATE" | "ALTER" | "DROP" => Self::Schema,
            "COMMIT" | "END" => Self::Commit,
            "ROLLBACK" => Self::Rollback,
            "BEGIN" | "SAVEPOINT" | "RELEASE" => Self::Unsupported,
            _ => Self::Other,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Mutation)
    }
}

/// Return the first keyword of a statement, skipping whitespace and comments.
fn leading_keyword(sql: &str) -> &str {
    let rest = skip_trivia(sql);
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    &rest[..end]
}

fn skip_trivia(mut s: &str) -> &str {
    loop {
        let trimmed = s.trim_start();
        if let Some(after) = trimmed.strip_prefix("--") {
            s = after.find('\n').map(|i| &after[i + 1..]).unwrap_or("");
        } else if let Some(after) = trimmed.strip_prefix("/*") {
            s = after.find("*/").map(|i| &after[i + 2..]).unwrap_or("");
        } else {
            return trimmed;
        }
    }
}

/// Split SQL script text into individual statements.
///
/// Semicolons inside quoted strings, quoted identifiers (`"..."`, `` `...` ``,
/// `[...]`), comments and `CREATE TRIGGER ... BEGIN ... END` bodies do not
/// terminate a statement. Returned statements are trimmed and carry no
/// trailing semicolon; fragments that hold nothing but whitespace and
/// comments are dropped.
pub fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut word = String::new();
    let mut trigger = TriggerBody::default();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            current.push(c);
            continue;
        }
        if !word.is_empty() {
            trigger.word(&word);
            word.clear();
        }

        match c {
            '\'' | '"' | '`' => {
                current.push(c);
                // Doubled quotes are escapes and simply re-enter the literal.
                for inner in chars.by_ref() {
                    current.push(inner);
                    if inner == c {
                        break;
                    }
                }
            }
            '[' => {
                current.push(c);
                for inner in chars.by_ref() {
                    current.push(inner);
                    if inner == ']' {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                current.push(c);
                for inner in chars.by_ref() {
                    current.push(inner);
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                current.push(c);
                current.push(chars.next().unwrap_or('*'));
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    current.push(inner);
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            ';' if trigger.is_open() => current.push(c),
            ';' => {
                push_statement(&mut statements, &mut current);
                trigger = TriggerBody::default();
            }
            _ => current.push(c),
        }
    }
    push_statement(&mut statements, &mut current);

    statements
}

/// Where the scanner is in the leading words of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Lead {
    #[default]
    Start,
    Create,
    CreateTemp,
    Trigger,
    Other,
}

/// `BEGIN`/`CASE` ... `END` nesting inside a `CREATE TRIGGER` statement.
#[derive(Debug, Default)]
struct TriggerBody {
    lead: Lead,
    depth: usize,
}

impl TriggerBody {
    fn word(&mut self, word: &str) {
        let word = word.to_ascii_uppercase();
        self.lead = match (self.lead, word.as_str()) {
            (Lead::Start, "CREATE") => Lead::Create,
            (Lead::Create, "TEMP" | "TEMPORARY") => Lead::CreateTemp,
            (Lead::Create | Lead::CreateTemp, "TRIGGER") => Lead::Trigger,
            (Lead::Trigger, "BEGIN" | "CASE") => {
                self.depth += 1;
                Lead::Trigger
            }
            (Lead::Trigger, "END") => {
                self.depth = self.depth.saturating_sub(1);
                Lead::Trigger
            }
            (Lead::Trigger, _) => Lead::Trigger,
            _ => Lead::Other,
        };
    }

    fn is_open(&self) -> bool {
        self.depth > 0
    }
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !skip_trivia(statement).is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}
