//! Decompose-solve-integrate pipeline for high-complexity prompts.
//!
//! One decomposition call splits the prompt into ordered sub-problems, the
//! solves fan out concurrently (bounded by the backend's gate) and are
//! joined by an explicit barrier, and one integration call combines the
//! results. Total backend calls for N sub-problems: `1 + N + 1`, regardless
//! of solve failures.

use std::sync::Arc;

use futures::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::provider::{BackendRouter, NormalizedResponse, Prompt};

const DECOMPOSE_TEMPLATE: &str = "Decompose the following complex problem into an ordered \
list of smaller, independently solvable sub-problems. Reply with one sub-problem per line \
and nothing else.";

const INTEGRATE_TEMPLATE: &str = "Integrate the following solutions to the sub-problems \
into one coherent, complete answer to the original problem.";

/// An ordered element of a decomposition. Order is preserved end to end
/// through solving and integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubProblem {
    pub index: usize,
    pub text: String,
}

// Leading list markers models commonly emit: "1.", "2)", "-", "*", "•",
// "Sub-problem 3:".
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:sub.?problem\s*\d+\s*:|\d+\s*[.):]|[-*•])\s*").expect("invalid regex")
});

/// Parse a decomposition response into ordered sub-problems.
///
/// Splits on line boundaries, strips list markers, drops empty lines, and
/// keeps at most `max` entries. A response yielding nothing is a
/// [`Error::DecompositionParse`]; the pipeline recovers from it locally.
pub fn parse_subproblems(response: &str, max: usize) -> Result<Vec<SubProblem>> {
    let subproblems: Vec<SubProblem> = response
        .lines()
        .map(|line| LIST_MARKER.replace(line.trim(), "").into_owned())
        .filter(|line| !line.is_empty())
        .take(max)
        .enumerate()
        .map(|(index, text)| SubProblem { index, text })
        .collect();

    if subproblems.is_empty() {
        return Err(Error::DecompositionParse(format!(
            "no sub-problems in a {}-character response",
            response.len()
        )));
    }
    Ok(subproblems)
}

/// The high-complexity reasoning strategy.
pub struct DecomposePipeline {
    router: Arc<BackendRouter>,
    backend: String,
    max_subproblems: usize,
}

impl DecomposePipeline {
    pub fn new(router: Arc<BackendRouter>, backend: impl Into<String>, max_subproblems: usize) -> Self {
        Self {
            router,
            backend: backend.into(),
            max_subproblems: max_subproblems.max(1),
        }
    }

    /// Run the full decompose → solve → integrate flow.
    ///
    /// Decomposition and integration failures are terminal. A failed
    /// sub-solve fills its slot with a marker naming the sub-problem and
    /// processing continues.
    pub async fn run(&self, prompt: &Prompt) -> Result<NormalizedResponse> {
        let subproblems = self.decompose(prompt).await?;
        let solutions = self.solve_all(prompt, &subproblems).await;
        self.integrate(prompt, &subproblems, &solutions).await
    }

    async fn decompose(&self, prompt: &Prompt) -> Result<Vec<SubProblem>> {
        let decompose_text = format!("{DECOMPOSE_TEMPLATE}\n\n# Problem\n{}", prompt.text);
        let response = self
            .router
            .call(&self.backend, &prompt.with_text(decompose_text))
            .await?;

        match parse_subproblems(&response.text, self.max_subproblems) {
            Ok(subproblems) => {
                tracing::debug!(count = subproblems.len(), "decomposed prompt");
                Ok(subproblems)
            }
            Err(e) => {
                // Recovered locally: degrade to a single sub-problem
                // instead of aborting.
                tracing::warn!(error = %e, "solving prompt as one sub-problem");
                Ok(vec![SubProblem {
                    index: 0,
                    text: prompt.text.clone(),
                }])
            }
        }
    }

    /// Solve every sub-problem, concurrently but gate-bounded. Dispatch
    /// order follows the sub-problem index; completion order is
    /// unconstrained. Results land in slots indexed by position, with
    /// failures replaced by an explicit marker.
    async fn solve_all(&self, prompt: &Prompt, subproblems: &[SubProblem]) -> Vec<String> {
        let solves = subproblems.iter().map(|sub| {
            let solve_prompt = prompt.with_text(sub.text.clone());
            async move {
                match self.router.call(&self.backend, &solve_prompt).await {
                    Ok(response) => response.text,
                    Err(e) => {
                        tracing::warn!(index = sub.index, error = %e, "sub-solve failed");
                        format!("[sub-problem {} failed: {}]", sub.index + 1, e)
                    }
                }
            }
        });

        // Barrier: integration never observes a partial result set.
        join_all(solves).await
    }

    async fn integrate(
        &self,
        prompt: &Prompt,
        subproblems: &[SubProblem],
        solutions: &[String],
    ) -> Result<NormalizedResponse> {
        let mut integrate_text = format!(
            "{INTEGRATE_TEMPLATE}\n\n# Original problem\n{}\n\n# Sub-problems and solutions\n",
            prompt.text
        );
        for (sub, solution) in subproblems.iter().zip(solutions) {
            integrate_text.push_str(&format!(
                "{}. {}\nSolution: {}\n\n",
                sub.index + 1,
                sub.text,
                solution
            ));
        }
        integrate_text.push_str("# Integrated answer:");

        self.router
            .call(&self.backend, &prompt.with_text(integrate_text))
            .await
    }
}
