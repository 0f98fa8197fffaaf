use regex::Regex;

/// A query whose `@name` placeholders were rewritten to positional `$n` ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParametrizedQuery {
    pub raw_query: String,
    /// Placeholder names without their sigil, `params[n - 1]` is bound to `$n`.
    pub params: Vec<String>,
}

/// Splits a query into alternating unquoted and quoted slices, starting with an unquoted one.
fn split_query(query: &str) -> Vec<&str> {
    let mut split_query = vec![];
    let mut quote = None;
    let mut last = 0;
    for (idx, char) in query.char_indices() {
        // SQL escapes quotes by doubling them, which closes and immediately reopens the slice.
        match quote {
            None if char == '\'' || char == '"' => {
                split_query.push(&query[last..idx]);
                last = idx;
                quote = Some(char);
            }
            Some(close) if char == close => {
                split_query.push(&query[last..idx + 1]);
                last = idx + 1;
                quote = None;
            }
            _ => {}
        }
    }
    split_query.push(&query[last..]);
    split_query
}

pub fn parse_into_postgres(query: &str) -> Result<ParametrizedQuery, regex::Error> {
    let mut params: Vec<String> = Vec::new();
    let placeholder_pattern = Regex::new(r"@[A-Za-z_][A-Za-z0-9_]*")?;

    let mut postgres_query = String::with_capacity(query.len());
    for (id, slice) in split_query(query).into_iter().enumerate() {
        if id % 2 == 1 {
            postgres_query += slice;
            continue;
        }
        let mut head = 0;
        for placeholder in placeholder_pattern.find_iter(slice) {
            let start = placeholder.start();
            if slice[..start].ends_with('@') {
                // @@name is a system variable, not a parameter
                continue;
            }
            postgres_query += &slice[head..start];
            let param_name = &placeholder.as_str()[1..];
            let param_index = 1 + match params.iter().position(|param| param == param_name) {
                Some(position) => position,
                None => {
                    params.push(param_name.to_string());
                    params.len() - 1
                }
            };
            postgres_query += &format!("${param_index}");
            head = placeholder.end();
        }
        postgres_query += &slice[head..];
    }
    Ok(ParametrizedQuery {
        raw_query: postgres_query,
        params,
    })
}
