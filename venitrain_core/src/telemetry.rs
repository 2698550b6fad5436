//! Telemetry line grammar and sample validation.
//!
//! Wire format, one record per line:
//!
//! ```text
//! angleR:<real> pressure:<real> angleP:<real> vein:<0|1>
//! ```
//!
//! Labels are case-insensitive, fields are separated by one or more blanks and
//! may carry blanks after the colon. Rejected lines are dropped by the caller;
//! a noisy serial link produces them routinely.

use serde::Serialize;
use thiserror::Error;
use winnow::ascii::{Caseless, space0, space1};
use winnow::combinator::preceded;
use winnow::error::{ContextError, ErrMode};
use winnow::token::{literal, take_while};
use winnow::{ModalResult, Parser};

/// One validated telemetry reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetrySample {
    /// Seconds since the recording run started (host clock).
    pub time_s: f64,
    /// Raw needle angle in degrees.
    pub angle_raw: f64,
    pub pressure: f64,
    /// Filtered needle angle in degrees.
    pub angle_processed: f64,
    pub vein_touch: bool,
}

/// Why a line was not turned into a sample.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("line does not match the telemetry shape")]
    Malformed,
    #[error("field `{0}` is not a finite number")]
    NonFinite(&'static str),
    #[error("vein flag must be 0 or 1")]
    VeinOutOfRange,
}

/// Field tokens as they appear on the wire, before numeric conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawFields<'s> {
    angle_raw: &'s str,
    pressure: &'s str,
    angle_processed: &'s str,
    vein: &'s str,
}

fn numeric<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., ('0'..='9', '.', '+', '-')).parse_next(input)
}

fn labeled<'s>(label: &'static str) -> impl Parser<&'s str, &'s str, ErrMode<ContextError>> {
    preceded((literal(Caseless(label)), ':', space0), numeric)
}

fn record<'s>(input: &mut &'s str) -> ModalResult<RawFields<'s>> {
    (
        labeled("angleR"),
        preceded(space1, labeled("pressure")),
        preceded(space1, labeled("angleP")),
        preceded(space1, labeled("vein")),
    )
        .map(|(angle_raw, pressure, angle_processed, vein)| RawFields {
            angle_raw,
            pressure,
            angle_processed,
            vein,
        })
        .parse_next(input)
}

fn finite(field: &'static str, token: &str) -> Result<f64, Rejection> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Rejection::NonFinite(field)),
    }
}

/// Parse one decoded line into a sample stamped with `elapsed_s`.
///
/// The caller supplies `elapsed_s` as (now - recording start); no timing
/// happens here.
pub fn parse_line(line: &str, elapsed_s: f64) -> Result<TelemetrySample, Rejection> {
    let fields = record.parse(line.trim()).map_err(|_| Rejection::Malformed)?;
    let angle_raw = finite("angleR", fields.angle_raw)?;
    let pressure = finite("pressure", fields.pressure)?;
    let angle_processed = finite("angleP", fields.angle_processed)?;
    let vein_touch = match fields.vein {
        "0" => false,
        "1" => true,
        _ => return Err(Rejection::VeinOutOfRange),
    };
    Ok(TelemetrySample {
        time_s: elapsed_s.max(0.0),
        angle_raw,
        pressure,
        angle_processed,
        vein_touch,
    })
}
