mod currency;
mod date;
mod duration;
mod number;

pub use currency::{
    currency_symbol, format_currency, format_number_into_currency, is_zero_decimal,
    sanitize_currency,
};
pub use date::{DATE_TOOLTIP_FORMAT, format_date, format_datetime, parse_datetime, time_ago};
pub use duration::{convert_size, format_time, seconds_to_duration};
pub use number::{MAX_PRECISION, NumberFormat, format_number};
