//! A minimal implementation of the XML Schema datatypes SPARQL expression evaluation needs:
//! `boolean`, `integer`, `decimal`, `double`, `dateTime` and `date`.

mod boolean;
mod date_time;
mod decimal;
mod double;
mod integer;

pub use crate::boolean::{Boolean, ParseBooleanError};
pub use crate::date_time::{Date, DateTime, TimezoneOffset, XsdDateTimeParseError};
pub use crate::decimal::{Decimal, ParseDecimalError, TooLargeForDecimalError};
pub use crate::double::Double;
pub use crate::integer::{Integer, TooLargeForIntegerError};
