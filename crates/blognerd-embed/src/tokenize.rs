use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// XLM-R `<pad>` id.
const PAD_ID: u32 = 1;

/// Encode `texts` into `[B, max_len]` id and attention-mask tensors,
/// truncating long inputs and right-padding short ones.
pub fn tokenize_batch(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let mut ids = Vec::with_capacity(texts.len() * max_len);
    let mut mask = Vec::with_capacity(texts.len() * max_len);
    for text in texts {
        let enc = tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut row_ids = enc.get_ids().to_vec();
        let mut row_mask = enc.get_attention_mask().to_vec();
        row_ids.resize(max_len, PAD_ID);
        row_mask.resize(max_len, 0);
        ids.extend(row_ids);
        mask.extend(row_mask);
    }
    let batch = texts.len();
    let input_ids = Tensor::from_vec(ids, (batch, max_len), device)?;
    let attention_mask = Tensor::from_vec(mask, (batch, max_len), device)?;
    Ok((input_ids, attention_mask))
}
