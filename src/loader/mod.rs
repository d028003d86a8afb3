//! Reloading saved optimization results for a specific task head.

mod head;
mod quantized;

#[cfg(test)]
mod tests;

pub use head::{
    CausalLm, MaskedLm, MultipleChoice, QuestionAnswering, Seq2SeqLm, SequenceClassification,
    TaskHead, TokenClassification,
};
pub use quantized::QuantizedModel;

pub type QuantizedModelForSequenceClassification = QuantizedModel<SequenceClassification>;
pub type QuantizedModelForQuestionAnswering = QuantizedModel<QuestionAnswering>;
pub type QuantizedModelForTokenClassification = QuantizedModel<TokenClassification>;
pub type QuantizedModelForMultipleChoice = QuantizedModel<MultipleChoice>;
pub type QuantizedModelForMaskedLm = QuantizedModel<MaskedLm>;
pub type QuantizedModelForCausalLm = QuantizedModel<CausalLm>;
pub type QuantizedModelForSeq2SeqLm = QuantizedModel<Seq2SeqLm>;
