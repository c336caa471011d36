//! Backend registration and dispatch
//!
//! Backends are named on the command line as `name` or
//! `name:key1=value1,key2=value2`. This module parses that string and
//! opens the matching register backend behind `Box<dyn RegisterIo>`.

use crate::cli::parse_number;
use crate::error::CliError;
use csrflash_core::RegisterIo;
use std::collections::HashMap;

/// Information about a backend
pub struct BackendInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Short description, including accepted parameters
    pub description: &'static str,
}

/// Get information about all available backends (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BackendInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        name: "dummy",
        description: "In-memory CSR flash emulator \
            (size=<cells>,busy=<polls>,vpp_low=<0|1>,protect=<start>-<end>)",
    });

    #[cfg(feature = "mmio")]
    backends.push(BackendInfo {
        name: "mmio",
        description: "Physical memory window via /dev/mem, requires root \
            (base=<addr>,size=<bytes>,width=<8|16|32>,stride=<bytes>)",
    });

    backends
}

/// Parsed backend parameters
#[derive(Debug)]
pub struct BackendParams {
    /// Backend name
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl BackendParams {
    /// Numeric parameter, if present
    pub fn number(&self, key: &str) -> Result<Option<u64>, CliError> {
        self.params
            .get(key)
            .map(|value| {
                parse_number(value).map_err(|reason| CliError::InvalidParam {
                    param: key.to_string(),
                    value: value.clone(),
                    reason,
                })
            })
            .transpose()
    }

    /// Numeric parameter that must be present
    pub fn required_number(&self, backend: &'static str, key: &'static str) -> Result<u64, CliError> {
        self.number(key)?
            .ok_or(CliError::MissingParam { backend, param: key })
    }
}

/// Parse a backend string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_backend_params(s: &str) -> Result<BackendParams, CliError> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(CliError::InvalidParamFormat(opt.to_string()));
            }
        }
    }

    Ok(BackendParams {
        name: name.to_string(),
        params,
    })
}

/// Open a register backend by its command-line specification
pub fn open_backend(spec: &str) -> Result<Box<dyn RegisterIo>, CliError> {
    let params = parse_backend_params(spec)?;
    log::debug!("Opening backend {} with {:?}", params.name, params.params);

    match params.name.as_str() {
        #[cfg(feature = "dummy")]
        "dummy" => Ok(Box::new(open_dummy(&params)?)),

        #[cfg(feature = "mmio")]
        "mmio" => Ok(Box::new(open_mmio(&params)?)),

        _ => Err(CliError::UnknownBackend(params.name)),
    }
}

#[cfg(feature = "dummy")]
fn parse_range(param: &str, value: &str) -> Result<core::ops::Range<u32>, CliError> {
    let invalid = |reason: String| CliError::InvalidParam {
        param: param.to_string(),
        value: value.to_string(),
        reason,
    };

    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| invalid("expected <start>-<end>".to_string()))?;
    let start = parse_number(start).map_err(invalid)?;
    let end = parse_number(end).map_err(invalid)?;
    if start >= end || end > u64::from(u32::MAX) {
        return Err(invalid("empty or oversized range".to_string()));
    }
    Ok(start as u32..end as u32)
}

/// Convert a parsed number into a narrower type, rejecting values that don't fit
#[cfg(any(feature = "dummy", feature = "mmio"))]
fn narrow<T: TryFrom<u64>>(param: &str, value: u64) -> Result<T, CliError> {
    T::try_from(value).map_err(|_| CliError::InvalidParam {
        param: param.to_string(),
        value: format!("{:#x}", value),
        reason: "value too large".to_string(),
    })
}

#[cfg(feature = "dummy")]
fn open_dummy(params: &BackendParams) -> Result<csrflash_dummy::DummyCsrFlash, CliError> {
    use csrflash_dummy::{DummyConfig, DummyCsrFlash, MAX_SIZE};

    let mut config = DummyConfig::default();
    if let Some(size) = params.number("size")? {
        if size > u64::from(MAX_SIZE) {
            return Err(CliError::InvalidParam {
                param: "size".to_string(),
                value: format!("{:#x}", size),
                reason: format!("at most {:#x} cells", MAX_SIZE),
            });
        }
        config.size = narrow("size", size)?;
    }
    if let Some(busy) = params.number("busy")? {
        config.busy_polls = busy.min(u64::from(u32::MAX)) as u32;
    }
    if let Some(vpp_low) = params.number("vpp_low")? {
        config.vpp_low = vpp_low != 0;
    }
    if let Some(range) = params.params.get("protect") {
        config.protected.push(parse_range("protect", range)?);
    }

    log::info!(
        "Using dummy flash: {} cells, {} busy poll(s) per program",
        config.size,
        config.busy_polls
    );
    Ok(DummyCsrFlash::new(config))
}

#[cfg(feature = "mmio")]
fn open_mmio(params: &BackendParams) -> Result<csrflash_mmio::MmioRegisters, CliError> {
    use csrflash_mmio::{MmioRegisters, RegisterWidth};

    let base = params.required_number("mmio", "base")?;
    let size: usize = narrow("size", params.required_number("mmio", "size")?)?;

    let width = match params.number("width")? {
        None => RegisterWidth::default(),
        Some(bits) => {
            RegisterWidth::from_bits(narrow("width", bits)?).ok_or_else(|| {
                CliError::InvalidParam {
                    param: "width".to_string(),
                    value: bits.to_string(),
                    reason: "expected 8, 16 or 32".to_string(),
                }
            })?
        }
    };
    let stride = match params.number("stride")? {
        Some(stride) => narrow("stride", stride)?,
        None => width.bytes(),
    };

    log::info!(
        "Mapping {:#x} bytes at {:#x} ({}-bit registers, stride {})",
        size,
        base,
        width.bytes() * 8,
        stride
    );
    Ok(MmioRegisters::open(base, size, width, stride)?)
}
