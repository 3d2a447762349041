use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use ringbuf::HeapRb;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Latest sensor snapshot: instantaneous loudness plus low/mid/high band
/// energies (20-250 / 250-2000 / 2000-5000 Hz), all 0..1.
#[derive(Debug, Clone, Copy)]
pub struct AudioSample {
    pub level: f32,
    pub bands: [f32; 3],
}

impl Default for AudioSample {
    fn default() -> Self {
        Self {
            level: 0.0,
            bands: [0.0; 3],
        }
    }
}

/// Seqlock over atomics so the frame loop can read the newest snapshot
/// without blocking the analyzer thread.
pub struct AtomicAudioSample {
    seq: AtomicU64,
    level: AtomicU32,
    bands: [AtomicU32; 3],
}

impl AtomicAudioSample {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            level: AtomicU32::new(0),
            bands: std::array::from_fn(|_| AtomicU32::new(0)),
        }
    }

    pub fn store(&self, s: AudioSample) {
        self.seq.fetch_add(1, Ordering::Release); // odd => write in progress
        self.level.store(s.level.to_bits(), Ordering::Relaxed);
        for (dst, src) in self.bands.iter().zip(s.bands) {
            dst.store(src.to_bits(), Ordering::Relaxed);
        }
        self.seq.fetch_add(1, Ordering::Release); // even => stable
    }

    pub fn load(&self) -> AudioSample {
        loop {
            let v1 = self.seq.load(Ordering::Acquire);
            if v1 & 1 == 1 {
                continue;
            }

            let level = f32::from_bits(self.level.load(Ordering::Relaxed));
            let mut bands = [0.0f32; 3];
            for (i, src) in self.bands.iter().enumerate() {
                bands[i] = f32::from_bits(src.load(Ordering::Relaxed));
            }

            let v2 = self.seq.load(Ordering::Acquire);
            if v1 == v2 {
                return AudioSample { level, bands };
            }
        }
    }
}

impl Default for AtomicAudioSample {
    fn default() -> Self {
        Self::new()
    }
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host.input_devices().context("enumerate input devices")?;

    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {}", name)?;
    }
    Ok(())
}

/// Owns the microphone stream and the analyzer thread for their lifetime.
pub struct AudioSystem {
    _stream: cpal::Stream,
    stop: Arc<AtomicBool>,
    analyzer_handle: Option<thread::JoinHandle<()>>,
    sample: Arc<AtomicAudioSample>,
    pub sample_rate_hz: u32,
}

impl AudioSystem {
    pub fn new(device_query: Option<&str>) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = select_input_device(&host, device_query)?;
        let supported = device
            .default_input_config()
            .context("get default input config")?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.clone().into();

        let rb_capacity = (sample_rate_hz as usize).saturating_mul(4);
        let rb = HeapRb::<f32>::new(rb_capacity);
        let (mut prod, mut cons) = rb.split();

        let stop = Arc::new(AtomicBool::new(false));
        let sample = Arc::new(AtomicAudioSample::new());
        let sample_for_thread = Arc::clone(&sample);
        let stop_for_thread = Arc::clone(&stop);

        let err_fn = |err| eprintln!("audio stream error: {err}");

        let stream = match supported.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            fmt => return Err(anyhow!("unsupported sample format: {fmt:?}")),
        };

        stream.play().context("start input stream")?;

        let analyzer_handle = thread::spawn(move || {
            analyze_loop(
                &mut cons,
                sample_rate_hz,
                &stop_for_thread,
                &sample_for_thread,
            )
        });

        Ok(Self {
            _stream: stream,
            stop,
            analyzer_handle: Some(analyzer_handle),
            sample,
            sample_rate_hz,
        })
    }

    /// Non-blocking read of the latest snapshot. Stale reads are fine; the
    /// conditioner treats the zero sample as silence.
    pub fn sample(&self) -> AudioSample {
        self.sample.load()
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.analyzer_handle.take() {
            let _ = h.join();
        }
    }
}

fn select_input_device(
    host: &cpal::Host,
    device_query: Option<&str>,
) -> anyhow::Result<cpal::Device> {
    let devices = host
        .input_devices()
        .context("enumerate input devices")?
        .collect::<Vec<_>>();

    let want = device_query.map(|s| s.to_lowercase());
    if let Some(want) = want.as_deref() {
        if let Some(dev) = devices.iter().find(|d| {
            d.name()
                .map(|n| n.to_lowercase().contains(want))
                .unwrap_or(false)
        }) {
            return Ok(dev.clone());
        }
        return Err(anyhow!("no input device matching: {want}"));
    }

    host.default_input_device()
        .ok_or_else(|| anyhow!("no default input device found"))
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    prod: &mut ringbuf::HeapProd<f32>,
) {
    for frame in data.chunks(channels) {
        let mut acc = 0.0f32;
        for s in frame {
            acc += (*s).to_float_sample();
        }
        let mono = acc / channels as f32;
        let _ = prod.try_push(mono);
    }
}

const BAND_EDGES_HZ: [(f32, f32); 3] = [(20.0, 250.0), (250.0, 2000.0), (2000.0, 5000.0)];

fn analyze_loop(
    cons: &mut ringbuf::HeapCons<f32>,
    sample_rate_hz: u32,
    stop: &AtomicBool,
    out: &AtomicAudioSample,
) {
    let n = 1024usize;
    let hop = 256usize;

    let mut scratch = vec![0.0f32; n];
    let mut write_pos = 0usize;
    let mut filled = 0usize;
    let mut since_last = 0usize;

    let hann = (0..n)
        .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / (n as f32)).cos())
        .collect::<Vec<_>>();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let mut fft_buf = vec![Complex { re: 0.0, im: 0.0 }; n];
    let mut mags = vec![0.0f32; n / 2];

    let mut level_s = 0.0f32;
    let mut bands_s = [0.0f32; 3];

    while !stop.load(Ordering::Relaxed) {
        let mut got_any = false;
        while let Some(s) = cons.try_pop() {
            got_any = true;
            scratch[write_pos] = s;
            write_pos = (write_pos + 1) % n;
            if filled < n {
                filled += 1;
            }
            since_last += 1;
            if filled == n && since_last >= hop {
                since_last = 0;
                let (level, bands) = analyze_window(
                    &scratch,
                    write_pos,
                    &hann,
                    &fft,
                    &mut fft_buf,
                    &mut mags,
                    sample_rate_hz,
                );

                // Light smoothing so the level does not flicker hop to hop.
                level_s = level_s * 0.8 + level * 0.2;
                for i in 0..bands_s.len() {
                    bands_s[i] = bands_s[i] * 0.8 + bands[i] * 0.2;
                }

                out.store(AudioSample {
                    level: level_s,
                    bands: bands_s,
                });
            }
        }

        if !got_any {
            thread::sleep(Duration::from_millis(1));
        }
    }
}

fn analyze_window(
    scratch: &[f32],
    write_pos: usize,
    hann: &[f32],
    fft: &Arc<dyn rustfft::Fft<f32>>,
    fft_buf: &mut [Complex<f32>],
    mags: &mut [f32],
    sample_rate_hz: u32,
) -> (f32, [f32; 3]) {
    let n = fft_buf.len();
    let half = mags.len();

    let mut rms_acc = 0.0f32;
    for i in 0..n {
        let s = scratch[(write_pos + i) % n];
        rms_acc += s * s;
        fft_buf[i].re = s * hann[i];
        fft_buf[i].im = 0.0;
    }
    let level = (rms_acc / n as f32).sqrt().clamp(0.0, 1.0);

    fft.process(fft_buf);
    for (i, c) in fft_buf.iter().take(half).enumerate() {
        mags[i] = (c.re * c.re + c.im * c.im).sqrt();
    }

    let sr = sample_rate_hz as f32;
    let mut bands = [0.0f32; 3];
    for (b, &(lo, hi)) in BAND_EDGES_HZ.iter().enumerate() {
        let mut acc = 0.0f32;
        let mut count = 0u32;
        for i in 1..half {
            let f = (i as f32) * sr / (n as f32);
            if f >= lo && f < hi {
                acc += mags[i];
                count += 1;
            }
        }
        let denom = count.max(1) as f32;
        // Log-ish compression into 0..1.
        bands[b] = ((acc / denom) * 0.01).tanh();
    }

    (level, bands)
}
