use crate::number::{NumberFormat, format_number};

const ZERO_DECIMAL: [&str; 4] = ["JPY", "KRW", "VND", "IDR"];

pub fn is_zero_decimal(currency: &str) -> bool {
    ZERO_DECIMAL.contains(&currency)
}

/// Display symbol for an ISO currency code. Unknown codes display as themselves.
pub fn currency_symbol(currency: &str) -> &str {
    match currency {
        "USD" | "AUD" | "CAD" | "SGD" => "$",
        "INR" => "₹",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" | "CNY" => "¥",
        "AED" => "د.إ",
        "KRW" => "₩",
        "CHF" => "CHF",
        other => other,
    }
}

fn currency_number_format(currency: &str, fallback: NumberFormat) -> NumberFormat {
    match currency {
        "INR" => NumberFormat::INDIAN,
        "EUR" => NumberFormat::EUROPEAN,
        "CHF" => NumberFormat::SWISS,
        c if is_zero_decimal(c) => NumberFormat::COMMA_WHOLE,
        _ => fallback,
    }
}

/// Format an amount as `<symbol> <number>`.
///
/// An empty `currency` yields the bare number. When `precision` is `None` the
/// currency's own number format decides the decimals.
pub fn format_currency(
    value: f64,
    currency: &str,
    precision: Option<u32>,
    fallback: NumberFormat,
) -> String {
    if currency.is_empty() {
        return format_number(value, fallback, precision);
    }

    let format = currency_number_format(currency, fallback);
    let number = format_number(value, format, precision);
    if number.is_empty() {
        return number;
    }
    format!("{} {}", currency_symbol(currency), number)
}

struct LocaleStyle {
    symbol: &'static str,
    suffix: bool,
    decimal_sep: char,
    group_sep: &'static str,
    indian: bool,
}

fn locale_style(currency: &str) -> Option<LocaleStyle> {
    let style = |symbol, suffix, decimal_sep, group_sep, indian| LocaleStyle {
        symbol,
        suffix,
        decimal_sep,
        group_sep,
        indian,
    };
    Some(match currency {
        "AED" => style("AED", false, '.', ",", false),
        "AUD" => style("$", false, '.', ",", false),
        "CHF" => style("CHF", false, '.', "’", false),
        "CNY" => style("¥", false, '.', ",", false),
        "EUR" => style("€", true, ',', ".", false),
        "GBP" => style("£", false, '.', ",", false),
        "INR" => style("₹", false, '.', ",", true),
        "JPY" => style("￥", false, '.', ",", false),
        "USD" => style("$", false, '.', ",", false),
        _ => return None,
    })
}

/// Locale-aware amount formatting as used by deal and quotation cards.
///
/// Each known currency renders the way its home locale does (`$ 1,234.56`,
/// `1.234,56 €`, `₹ 1,23,456.00`); unknown codes fall back to Indian grouping
/// with the code as prefix. Missing values render as an empty string.
pub fn format_number_into_currency(value: Option<f64>, currency: &str) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return String::new();
    };

    let precision = if is_zero_decimal(currency) { 0 } else { 2 };
    let style = locale_style(currency).unwrap_or(LocaleStyle {
        symbol: "",
        suffix: false,
        decimal_sep: '.',
        group_sep: ",",
        indian: true,
    });

    let base = if style.indian {
        NumberFormat::INDIAN
    } else {
        NumberFormat::WESTERN
    };
    let plain = format_number(value, base, Some(precision));
    let (sign, digits) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };

    let localized: String = digits
        .chars()
        .map(|c| match c {
            ',' => style.group_sep.to_string(),
            '.' => style.decimal_sep.to_string(),
            c => c.to_string(),
        })
        .collect();

    let symbol = if style.symbol.is_empty() {
        currency
    } else {
        style.symbol
    };

    if style.suffix {
        format!("{sign}{localized}\u{a0}{symbol}")
    } else {
        format!("{sign}{symbol} {localized}")
    }
}

/// Strip everything but digits, `.` and `-` from a formatted amount.
pub fn sanitize_currency(formatted: &str) -> String {
    formatted
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect()
}
