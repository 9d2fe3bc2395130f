/// Parsed contents of a Newick node label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLabel {
    pub support: Option<f64>,
    pub taxon: Option<String>,
    pub auxiliary: Option<String>,
}

/// Split an internal-node label of the form `support:taxon|auxiliary`.
///
/// Every part is optional. A bare number is read as a support value and
/// anything else as a taxon.
pub fn parse_label(raw: &str) -> ParsedLabel {
    let mut parsed = ParsedLabel::default();

    let mut label = raw.trim().trim_matches('\'').trim_matches('"').trim();
    if label.is_empty() {
        return parsed;
    }

    if let Some((head, aux)) = label.split_once('|') {
        parsed.auxiliary = non_empty(aux);
        label = head;
    }

    if let Some((support, taxon)) = label.split_once(':') {
        parsed.support = support.trim().parse::<f64>().ok();
        parsed.taxon = non_empty(taxon);
    } else if let Ok(support) = label.parse::<f64>() {
        parsed.support = Some(support);
    } else {
        parsed.taxon = non_empty(label);
    }

    parsed
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
