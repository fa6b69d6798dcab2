/// A number format pattern such as `#,###.##`.
///
/// Only the fixed set of patterns the desk server can be configured with is
/// recognised. Anything else falls back to [`NumberFormat::WESTERN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pattern: &'static str,
    decimal_sep: &'static str,
    group_sep: &'static str,
    precision: u32,
}

impl NumberFormat {
    pub const WESTERN: NumberFormat = NumberFormat::new("#,###.##", ".", ",", 2);
    pub const EUROPEAN: NumberFormat = NumberFormat::new("#.###,##", ",", ".", 2);
    pub const SPACED: NumberFormat = NumberFormat::new("# ###.##", ".", " ", 2);
    pub const SPACED_COMMA: NumberFormat = NumberFormat::new("# ###,##", ",", " ", 2);
    pub const SWISS: NumberFormat = NumberFormat::new("#'###.##", ".", "'", 2);
    pub const COMMA_SPACE: NumberFormat = NumberFormat::new("#, ###.##", ".", ", ", 2);
    pub const INDIAN: NumberFormat = NumberFormat::new("#,##,###.##", ".", ",", 2);
    pub const WESTERN_THREE: NumberFormat = NumberFormat::new("#,###.###", ".", ",", 3);
    pub const DOT_WHOLE: NumberFormat = NumberFormat::new("#.###", "", ".", 0);
    pub const COMMA_WHOLE: NumberFormat = NumberFormat::new("#,###", "", ",", 0);

    const ALL: [NumberFormat; 10] = [
        Self::WESTERN,
        Self::EUROPEAN,
        Self::SPACED,
        Self::SPACED_COMMA,
        Self::SWISS,
        Self::COMMA_SPACE,
        Self::INDIAN,
        Self::WESTERN_THREE,
        Self::DOT_WHOLE,
        Self::COMMA_WHOLE,
    ];

    const fn new(
        pattern: &'static str,
        decimal_sep: &'static str,
        group_sep: &'static str,
        precision: u32,
    ) -> Self {
        Self {
            pattern,
            decimal_sep,
            group_sep,
            precision,
        }
    }

    pub fn parse(pattern: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|f| f.pattern == pattern.trim())
            .unwrap_or(Self::WESTERN)
    }

    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Decimal places implied by the pattern, used when a field declares none.
    pub fn precision(&self) -> u32 {
        self.precision
    }

    fn indian_grouping(&self) -> bool {
        self.pattern == Self::INDIAN.pattern
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::WESTERN
    }
}

/// Decimals beyond this carry no information in an `f64`.
pub const MAX_PRECISION: u32 = 15;

/// Format `value` with digit grouping and a fixed number of decimals.
///
/// `precision` overrides the pattern's own precision and is capped at
/// [`MAX_PRECISION`]. Non-finite values render as an empty string.
pub fn format_number(value: f64, format: NumberFormat, precision: Option<u32>) -> String {
    if !value.is_finite() {
        return String::new();
    }

    let precision = precision.unwrap_or(format.precision).min(MAX_PRECISION) as usize;
    let fixed = format!("{:.*}", precision, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    // -0.001 at two decimals renders as "0.00", not "-0.00"
    let negative = value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');

    let mut out = String::with_capacity(fixed.len() + 8);
    if negative {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, format));
    if let Some(frac) = frac_part {
        // Whole-number patterns still honour an explicit precision
        out.push_str(if format.decimal_sep.is_empty() {
            "."
        } else {
            format.decimal_sep
        });
        out.push_str(frac);
    }
    out
}

fn group_digits(digits: &str, format: NumberFormat) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let step = if format.indian_grouping() { 2 } else { 3 };

    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(step);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    groups.push(tail);
    groups.join(format.group_sep)
}
