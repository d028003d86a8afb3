//! Task heads a saved model can be specialized for.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Downstream task served by the output head attached to a backbone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Task {
    SequenceClassification,
    QuestionAnswering,
    TokenClassification,
    MultipleChoice,
    MaskedLm,
    CausalLm,
    #[serde(rename = "seq2seq-lm")]
    Seq2SeqLm,
}

impl Task {
    /// Every supported task, in a stable order.
    pub const ALL: [Task; 7] = [
        Task::SequenceClassification,
        Task::QuestionAnswering,
        Task::TokenClassification,
        Task::MultipleChoice,
        Task::MaskedLm,
        Task::CausalLm,
        Task::Seq2SeqLm,
    ];

    /// Infer the task from an architecture class name such as
    /// `DistilBertForQuestionAnswering` or `GPT2LMHeadModel`.
    pub fn from_architecture(architecture: &str) -> Option<Self> {
        const SUFFIXES: [(&str, Task); 9] = [
            ("ForSequenceClassification", Task::SequenceClassification),
            ("ForQuestionAnswering", Task::QuestionAnswering),
            ("ForTokenClassification", Task::TokenClassification),
            ("ForMultipleChoice", Task::MultipleChoice),
            ("ForMaskedLM", Task::MaskedLm),
            ("ForCausalLM", Task::CausalLm),
            ("LMHeadModel", Task::CausalLm),
            ("ForConditionalGeneration", Task::Seq2SeqLm),
            ("ForSeq2SeqLM", Task::Seq2SeqLm),
        ];
        SUFFIXES
            .iter()
            .find(|(suffix, _)| architecture.ends_with(suffix))
            .map(|(_, task)| *task)
    }

    /// Weight-name prefixes that identify this task's output head. A model
    /// carries the head if any of its weights starts with one of them.
    pub fn head_prefixes(&self) -> &'static [&'static str] {
        match self {
            Task::SequenceClassification => &["classifier", "score"],
            Task::QuestionAnswering => &["qa_outputs"],
            Task::TokenClassification => &["classifier"],
            Task::MultipleChoice => &["classifier"],
            Task::MaskedLm => &["lm_head", "cls.predictions", "vocab_projector"],
            Task::CausalLm => &["lm_head"],
            Task::Seq2SeqLm => &["lm_head", "shared"],
        }
    }

    /// Kebab-case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::SequenceClassification => "sequence-classification",
            Task::QuestionAnswering => "question-answering",
            Task::TokenClassification => "token-classification",
            Task::MultipleChoice => "multiple-choice",
            Task::MaskedLm => "masked-lm",
            Task::CausalLm => "causal-lm",
            Task::Seq2SeqLm => "seq2seq-lm",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
