//! Convolution kernels
//!
//! Two implementations of the same operation:
//! - `convolve_direct` / `convolve_into` - direct time-domain form,
//!   `out[n] = sum(in[n-k] * ir[k])`. The reference semantics.
//! - `FftConvolver` - streaming uniform-partitioned overlap-add convolution
//!   using RealFFT. Numerically equivalent to the direct form within float
//!   tolerance, at `O(n log n)` per block instead of `O(n * ir_len)`.

use std::sync::Arc;

use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use crate::Processor;
use auralis_core::{AuralisError, AuralisResult, Sample};

/// Full direct convolution: returns `input.len() + ir.len() - 1` samples.
pub fn convolve_direct(input: &[Sample], ir: &[Sample]) -> Vec<Sample> {
    if input.is_empty() || ir.is_empty() {
        return vec![0.0; input.len() + ir.len()];
    }
    let mut out = vec![0.0; input.len() + ir.len() - 1];
    for (i, &x) in input.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (k, &h) in ir.iter().enumerate() {
            out[i + k] += x * h;
        }
    }
    out
}

/// Accumulating direct convolution truncated to `output.len()`.
///
/// Adds `input (*) ir` into `output`; contributions past the end of
/// `output` are discarded.
pub fn convolve_into(input: &[Sample], ir: &[Sample], output: &mut [Sample]) {
    let out_len = output.len();
    for (i, &x) in input.iter().enumerate() {
        if i >= out_len {
            break;
        }
        if x == 0.0 {
            continue;
        }
        let max_k = ir.len().min(out_len - i);
        for (k, &h) in ir.iter().take(max_k).enumerate() {
            output[i + k] += x * h;
        }
    }
}

/// Streaming uniform-partitioned overlap-add convolver.
///
/// The impulse response is split into partitions of one block each; input
/// spectra are kept in a frequency-delay line so each block only needs one
/// forward and one inverse FFT regardless of IR length.
pub struct FftConvolver {
    /// Partition spectra (half spectrum per partition)
    partitions: Vec<Vec<Complex<f32>>>,
    /// Frequency-delay line of past input spectra
    fdl: Vec<Vec<Complex<f32>>>,
    /// FDL write position
    fdl_pos: usize,
    /// Overlap tail carried into the next block
    overlap: Vec<Sample>,
    /// Scratch: zero-padded input block
    scratch_time: Vec<Sample>,
    /// Scratch: accumulated spectrum
    scratch_freq: Vec<Complex<f32>>,
    /// Scratch: inverse FFT output
    scratch_out: Vec<Sample>,
    fft_forward: Arc<dyn RealToComplex<f32>>,
    fft_inverse: Arc<dyn ComplexToReal<f32>>,
    block_size: usize,
}

impl FftConvolver {
    /// Create a convolver for `ir`, processing fixed blocks of `block_size`.
    pub fn new(ir: &[Sample], block_size: usize) -> AuralisResult<Self> {
        if block_size == 0 {
            return Err(AuralisError::InvalidBlockSize(block_size));
        }

        let fft_size = block_size * 2;
        let spectrum_len = fft_size / 2 + 1;

        let mut planner = RealFftPlanner::<f32>::new();
        let fft_forward = planner.plan_fft_forward(fft_size);
        let fft_inverse = planner.plan_fft_inverse(fft_size);

        // Partition the IR into block-sized segments and transform each.
        let num_partitions = ir.len().div_ceil(block_size).max(1);
        let mut partitions = Vec::with_capacity(num_partitions);
        let mut padded = vec![0.0_f32; fft_size];
        for p in 0..num_partitions {
            let start = p * block_size;
            let end = (start + block_size).min(ir.len());
            padded.fill(0.0);
            if start < ir.len() {
                padded[..end - start].copy_from_slice(&ir[start..end]);
            }
            let mut spectrum = vec![Complex::new(0.0, 0.0); spectrum_len];
            fft_forward
                .process(&mut padded, &mut spectrum)
                .map_err(|e| AuralisError::Dsp(e.to_string()))?;
            partitions.push(spectrum);
        }

        let fdl = vec![vec![Complex::new(0.0, 0.0); spectrum_len]; num_partitions];
        log::debug!(
            "planned FFT convolver: {num_partitions} partition(s) of {block_size} samples \
             for a {}-sample IR",
            ir.len()
        );

        Ok(Self {
            partitions,
            fdl,
            fdl_pos: 0,
            overlap: vec![0.0; block_size],
            scratch_time: vec![0.0; fft_size],
            scratch_freq: vec![Complex::new(0.0, 0.0); spectrum_len],
            scratch_out: vec![0.0; fft_size],
            fft_forward,
            fft_inverse,
            block_size,
        })
    }

    /// Block size this convolver was planned for
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Convolve one block. `input` and `output` must both be `block_size` long.
    pub fn process_block(&mut self, input: &[Sample], output: &mut [Sample]) -> AuralisResult<()> {
        if input.len() != self.block_size || output.len() != self.block_size {
            return Err(AuralisError::BufferSizeMismatch {
                expected: self.block_size,
                got: input.len().min(output.len()),
            });
        }

        let fft_size = self.block_size * 2;

        // Forward-transform the zero-padded input block into the FDL.
        self.scratch_time[..self.block_size].copy_from_slice(input);
        self.scratch_time[self.block_size..].fill(0.0);
        self.fft_forward
            .process(&mut self.scratch_time, &mut self.fdl[self.fdl_pos])
            .map_err(|e| AuralisError::Dsp(e.to_string()))?;

        // Accumulate partition * delayed-spectrum products.
        self.scratch_freq.fill(Complex::new(0.0, 0.0));
        let num_partitions = self.partitions.len();
        for (k, partition) in self.partitions.iter().enumerate() {
            let slot = (self.fdl_pos + num_partitions - k) % num_partitions;
            for ((acc, &x), &h) in self
                .scratch_freq
                .iter_mut()
                .zip(&self.fdl[slot])
                .zip(partition)
            {
                *acc += x * h;
            }
        }

        self.fft_inverse
            .process(&mut self.scratch_freq, &mut self.scratch_out)
            .map_err(|e| AuralisError::Dsp(e.to_string()))?;

        // Overlap-add, with RealFFT's 1/N normalization folded in.
        let norm = 1.0 / fft_size as f32;
        for i in 0..self.block_size {
            output[i] = self.scratch_out[i] * norm + self.overlap[i];
            self.overlap[i] = self.scratch_out[self.block_size + i] * norm;
        }

        self.fdl_pos = (self.fdl_pos + 1) % num_partitions;
        Ok(())
    }
}

impl Processor for FftConvolver {
    fn reset(&mut self) {
        for slot in &mut self.fdl {
            slot.fill(Complex::new(0.0, 0.0));
        }
        self.overlap.fill(0.0);
        self.fdl_pos = 0;
    }
}
