/// Unit abbreviations used by MFDach and their display labels
const UNIT_LABELS: &[(&str, &str)] = &[
    ("psch", "pauschal"),
    ("m", "Meter"),
    ("m²", "Quadratmeter"),
    ("m³", "Kubikmeter"),
    ("lfm", "laufender Meter"),
    ("Std", "Stunde"),
    ("Stk", "Stück"),
    ("kg", "Kilogramm"),
    ("t", "Tonne"),
];

/// Look up the display label for a unit abbreviation.
///
/// An exact match wins; otherwise the first case-insensitive match is used,
/// so `STK` still resolves while `m` and `M` stay unambiguous.
pub fn describe_unit(code: &str) -> Option<&'static str> {
    let code = code.trim();
    UNIT_LABELS
        .iter()
        .find(|(abbr, _)| *abbr == code)
        .or_else(|| {
            UNIT_LABELS
                .iter()
                .find(|(abbr, _)| abbr.to_lowercase() == code.to_lowercase())
        })
        .map(|(_, label)| *label)
}
