use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

// BERT wordpiece vocabularies put [PAD] at id 0.
const PAD_ID: u32 = 0;

/// Tokenize a batch of texts into `[B, T]` input-id and attention-mask
/// tensors on `device`. Sequences are truncated at `max_len` and padded to
/// the longest sequence in the batch, so T = min(batch max, `max_len`).
pub fn tokenize_batch_on_device(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

    let seq_len = encodings
        .iter()
        .map(|enc| enc.get_ids().len())
        .max()
        .unwrap_or(1)
        .min(max_len);

    let batch = encodings.len();
    let mut ids = Vec::with_capacity(batch * seq_len);
    let mut mask = Vec::with_capacity(batch * seq_len);
    for enc in &encodings {
        let enc_ids = enc.get_ids();
        let enc_mask = enc.get_attention_mask();
        let take = enc_ids.len().min(seq_len);
        ids.extend_from_slice(&enc_ids[..take]);
        mask.extend_from_slice(&enc_mask[..take]);
        ids.extend(std::iter::repeat(PAD_ID).take(seq_len - take));
        mask.extend(std::iter::repeat(0u32).take(seq_len - take));
    }

    let input_ids = Tensor::from_vec(ids, (batch, seq_len), device)?;
    let attention_mask = Tensor::from_vec(mask, (batch, seq_len), device)?;
    Ok((input_ids, attention_mask))
}
