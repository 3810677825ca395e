use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// Masked mean pooling over the token axis followed by L2 normalization.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]` with 1 for real
/// tokens and 0 for padding. Returns `[B, H]` with unit-norm rows, so the
/// cosine similarity of any two rows is their plain dot product.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let dims = hidden.dims();
    ensure!(dims.len() == 3, "hidden shape must be [B,T,H], got {:?}", dims);
    let (batch, hidden_dim) = (dims[0], dims[2]);

    let mask = attention_mask
        .to_device(hidden.device())?
        .to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask_3d)?.sum(1)?;
    let lengths = mask.sum(1)?.unsqueeze(1)?.to_dtype(summed.dtype())?;
    let mean = summed.broadcast_div(&lengths)?;

    // F16 runs underflow below ~1e-7, hence the looser epsilon.
    let eps = match hidden.dtype() {
        DType::F16 => 1e-6,
        _ => 1e-12,
    };
    let norm = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + eps)?;
    let unit = mean.broadcast_div(&norm)?;

    ensure!(unit.dims() == &[batch, hidden_dim]);
    Ok(unit)
}
