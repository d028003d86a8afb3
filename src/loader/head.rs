//! Task-head descriptors.

use crate::error::{Error, Result};
use crate::model::{Model, Task};

/// A downstream task a saved model can be loaded for.
pub trait TaskHead {
    const TASK: Task;

    /// Reject models declaring another task or lacking this head's weights.
    ///
    /// A model that declares no task is judged by its weights alone.
    fn validate(model: &Model) -> Result<()> {
        if let Some(found) = model.task() {
            if found != Self::TASK {
                return Err(Error::IncompatibleConfig {
                    expected: format!("a {} model", Self::TASK),
                    found: format!("a {found} model"),
                });
            }
        }
        if !model.has_head(Self::TASK) {
            return Err(Error::IncompatibleConfig {
                expected: format!("{} head weights ({})", Self::TASK, Self::TASK.head_prefixes().join(", ")),
                found: "no matching weights".to_string(),
            });
        }
        Ok(())
    }
}

macro_rules! task_heads {
    ($($(#[$doc:meta])* $name:ident => $task:expr;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
            pub struct $name;

            impl TaskHead for $name {
                const TASK: Task = $task;
            }
        )*
    };
}

task_heads! {
    SequenceClassification => Task::SequenceClassification;
    QuestionAnswering => Task::QuestionAnswering;
    TokenClassification => Task::TokenClassification;
    MultipleChoice => Task::MultipleChoice;
    /// Masked language modeling (`...ForMaskedLM`).
    MaskedLm => Task::MaskedLm;
    /// Causal language modeling (`...ForCausalLM`, `...LMHeadModel`).
    CausalLm => Task::CausalLm;
    /// Encoder-decoder generation (`...ForConditionalGeneration`).
    Seq2SeqLm => Task::Seq2SeqLm;
}
