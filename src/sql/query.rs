
/// Query type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    /// SELECT queries
    Select,
    /// INSERT queries
    Insert,
    /// UPDATE queries
    Update,
    /// DELETE queries
    Delete,
    /// DROP statements
    Drop,
}

impl QueryType {
    /// Keywords in tie-break order
    pub const ALL: [QueryType; 5] = [
        QueryType::Select,
        QueryType::Insert,
        QueryType::Update,
        QueryType::Delete,
        QueryType::Drop,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            QueryType::Select => "SELECT",
            QueryType::Insert => "INSERT",
            QueryType::Update => "UPDATE",
            QueryType::Delete => "DELETE",
            QueryType::Drop => "DROP",
        }
    }

    /// Classify query text by the leftmost keyword it contains.
    ///
    /// Matching is case sensitive and does not respect word boundaries, so
    /// `INSERTED` counts as `INSERT`. Statements such as `SET timestamp=...;`
    /// that precede the real query in a slow log block do not affect the result
    /// unless they contain a keyword themselves.
    pub fn classify(sql: &str) -> Option<QueryType> {
        let mut best: Option<(usize, QueryType)> = None;

        for query_type in Self::ALL {
            if let Some(offset) = sql.find(query_type.keyword()) {
                // Strict comparison keeps the earlier keyword on a tie
                if best.map_or(true, |(min, _)| offset < min) {
                    best = Some((offset, query_type));
                }
            }
        }

        best.map(|(_, query_type)| query_type)
    }

    /// Classification as written to output; empty when no keyword is present
    pub fn label(sql: &str) -> &'static str {
        Self::classify(sql).map_or("", |t| t.keyword())
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}
