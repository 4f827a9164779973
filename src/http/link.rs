use url::Url;

/// One `<target>; param=value` entry of a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkValue {
    pub target: String,
    /// Relation types, lowercased. `rel="next last"` yields two.
    pub rels: Vec<String>,
}

/// Parses a `Link` header value (RFC 8288).
///
/// Entries that do not start with a `<target>` end parsing; everything
/// collected up to that point is returned.
pub fn parse_link_header(header: &str) -> Vec<LinkValue> {
    let mut links = Vec::new();
    let mut rest = header;

    loop {
        rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        let Some(after_open) = rest.strip_prefix('<') else {
            break;
        };
        let Some(close) = after_open.find('>') else {
            break;
        };
        let target = after_open[..close].trim();
        let (params, remainder) = split_params(&after_open[close + 1..]);
        rest = remainder;

        let rels = params
            .split(';')
            .filter_map(|param| {
                let (key, value) = param.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("rel")
                    .then(|| value.trim().trim_matches('"'))
            })
            .flat_map(str::split_whitespace)
            .map(str::to_ascii_lowercase)
            .collect();

        links.push(LinkValue {
            target: target.to_string(),
            rels,
        });
    }

    links
}

/// Splits at the first comma outside a quoted string.
fn split_params(s: &str) -> (&str, &str) {
    let mut in_quotes = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return (&s[..i], &s[i..]),
            _ => {}
        }
    }
    (s, "")
}

/// Finds the `rel="next"` target and resolves it against `base`.
pub fn next_link(header: &str, base: &Url) -> Result<Option<Url>, url::ParseError> {
    parse_link_header(header)
        .into_iter()
        .find(|link| link.rels.iter().any(|rel| rel == "next"))
        .map(|link| base.join(&link.target))
        .transpose()
}
