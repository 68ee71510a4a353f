// src/sampler.rs - Two-channel analog sampler with a plain-text register
use crate::config::SamplerConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Input attenuation of an ESP32-style SAR converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attenuation {
    Db0,
    Db2_5,
    Db6,
    Db11,
}

impl Attenuation {
    pub fn full_scale_millivolts(self) -> f64 {
        match self {
            Attenuation::Db0 => 1100.0,
            Attenuation::Db2_5 => 1500.0,
            Attenuation::Db6 => 2200.0,
            Attenuation::Db11 => 3300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdcWidth {
    Bits9,
    Bits10,
    Bits11,
    Bits12,
}

impl AdcWidth {
    pub fn bits(self) -> u8 {
        match self {
            AdcWidth::Bits9 => 9,
            AdcWidth::Bits10 => 10,
            AdcWidth::Bits11 => 11,
            AdcWidth::Bits12 => 12,
        }
    }

    pub fn max_raw(self) -> u16 {
        (1u16 << self.bits()) - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdcConfig {
    /// Board pin, or the IIO channel index when reading through sysfs.
    pub pin: u8,
    pub attenuation: Attenuation,
    pub width: AdcWidth,
}

impl AdcConfig {
    /// 11 dB attenuation (about 3.3 V full scale) at 12-bit resolution.
    pub fn on_pin(pin: u8) -> Self {
        Self {
            pin,
            attenuation: Attenuation::Db11,
            width: AdcWidth::Bits12,
        }
    }

    pub fn to_millivolts(&self, raw: u16) -> f64 {
        raw as f64 * self.attenuation.full_scale_millivolts() / self.width.max_raw() as f64
    }
}

pub trait AnalogChannel {
    fn config(&self) -> &AdcConfig;

    fn read_raw(&mut self) -> Result<u16>;

    fn read_millivolts(&mut self) -> Result<f64> {
        let raw = self.read_raw()?;
        Ok(self.config().to_millivolts(raw))
    }
}

/// Channel backed by a Linux IIO device, e.g. `/sys/bus/iio/devices/iio:device0`.
pub struct IioChannel {
    config: AdcConfig,
    path: PathBuf,
}

impl IioChannel {
    pub fn new(device_dir: impl AsRef<Path>, config: AdcConfig) -> Self {
        let path = device_dir
            .as_ref()
            .join(format!("in_voltage{}_raw", config.pin));
        Self { config, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AnalogChannel for IioChannel {
    fn config(&self) -> &AdcConfig {
        &self.config
    }

    fn read_raw(&mut self) -> Result<u16> {
        let pin = self.config.pin;
        let text = fs::read_to_string(&self.path).map_err(|source| Error::AdcRead { pin, source })?;
        let value = text.trim();
        let raw: u32 = value.parse().map_err(|_| Error::AdcMalformed {
            pin,
            value: value.to_string(),
        })?;

        let max = self.config.width.max_raw();
        if raw > max as u32 {
            return Err(Error::AdcOutOfRange { pin, raw, max });
        }
        Ok(raw as u16)
    }
}

/// Which samples end up in the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordMode {
    /// Only the last sample of the run is written.
    FinalSample,
    EverySample,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    pub index: usize,
    pub channel1_mv: f64,
    pub channel2_mv: f64,
}

impl SampleRecord {
    // Trailing empty field yields the space before the newline.
    fn fields(&self) -> [String; 4] {
        [
            self.index.to_string(),
            format!("{:?}", self.channel1_mv),
            format!("{:?}", self.channel2_mv),
            String::new(),
        ]
    }
}

impl fmt::Display for SampleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sample={} ch1={:.2} mV ch2={:.2} mV",
            self.index, self.channel1_mv, self.channel2_mv
        )
    }
}

/// Space separated register, one `"<index> <mv1> <mv2> "` line per record.
pub struct SampleRegister<W: Write> {
    writer: csv::Writer<W>,
}

impl SampleRegister<File> {
    /// Creates or truncates the register file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> SampleRegister<W> {
    pub fn from_writer(inner: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        Self { writer }
    }

    pub fn append(&mut self, record: &SampleRecord) -> Result<()> {
        self.writer.write_record(record.fields())?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

pub struct Sampler {
    samples: usize,
    interval: Duration,
    mode: RecordMode,
}

impl Sampler {
    pub fn new(samples: usize, interval: Duration, mode: RecordMode) -> Self {
        Self {
            samples,
            interval,
            mode,
        }
    }

    pub fn from_config(config: &SamplerConfig) -> Self {
        Self::new(config.samples, config.interval(), config.record_mode)
    }

    /// Reads both channels `samples` times. Every record is handed to
    /// `on_sample`; what reaches the register depends on the record mode.
    pub fn run<A, B, W, F>(
        &self,
        channel1: &mut A,
        channel2: &mut B,
        register: &mut SampleRegister<W>,
        mut on_sample: F,
    ) -> Result<Option<SampleRecord>>
    where
        A: AnalogChannel + ?Sized,
        B: AnalogChannel + ?Sized,
        W: Write,
        F: FnMut(&SampleRecord),
    {
        let mut last = None;

        for index in 0..self.samples {
            if index > 0 && !self.interval.is_zero() {
                std::thread::sleep(self.interval);
            }

            let record = SampleRecord {
                index,
                channel1_mv: channel1.read_millivolts()?,
                channel2_mv: channel2.read_millivolts()?,
            };
            on_sample(&record);

            if self.mode == RecordMode::EverySample {
                register.append(&record)?;
            }
            last = Some(record);
        }

        if self.mode == RecordMode::FinalSample {
            if let Some(record) = &last {
                register.append(record)?;
            }
        }

        tracing::debug!("Sampler finished after {} iterations", self.samples);
        Ok(last)
    }
}
