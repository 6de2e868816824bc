//! Task instructions for the three workflow phases.
//!
//! The custom instructions installed on the agent define what `Step1`,
//! `Step2` and `Step3` mean; each instruction here names its step and adds
//! the phase inputs and constraints.

use claude_agent::ToolAccess;

/// One stage of the bugfix workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Analyze,
    Plan,
    Fix,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Analyze => "analyze",
            Phase::Plan => "plan",
            Phase::Fix => "fix",
        }
    }

    /// The step name the custom instructions refer to.
    pub fn step(self) -> &'static str {
        match self {
            Phase::Analyze => "Step1",
            Phase::Plan => "Step2",
            Phase::Fix => "Step3",
        }
    }

    /// Only the fix phase gets tools that can change the workspace.
    pub fn tool_access(self) -> ToolAccess {
        match self {
            Phase::Analyze | Phase::Plan => ToolAccess::ReadOnly,
            Phase::Fix => ToolAccess::Full,
        }
    }
}

pub fn analyze_instruction(log_path: &str) -> String {
    format!(
        r#"Log file path: `{log_path}`.

Execute {step}: read the log, follow the call chain across projects, and
list the candidate root causes ranked by likelihood, each with the evidence
from the log and the source files involved.

Do not modify any code and do not run any git commands in this step.
"#,
        step = Phase::Analyze.step(),
    )
}

pub fn plan_instruction(log_path: &str, chosen_root_cause: &str) -> String {
    format!(
        r#"- Log file path: `{log_path}`.
- The user has chosen the following root cause:

{chosen_root_cause}

Based on this root cause:

Execute {step}: propose 2-3 alternative fix plans. For each plan give the
files to change, the strategy, and the risks and trade-offs.

Do not create, edit or delete any file and do not run any git commands in
this step.
"#,
        step = Phase::Plan.step(),
    )
}

pub fn fix_instruction(log_path: &str, fix_plan: &str, branch: &str, report_path: &str) -> String {
    format!(
        r#"Now the user has confirmed the final fix plan.

- Log file path: `{log_path}`.
- Confirmed fix plan:

{fix_plan}

Execute {step}:
1. Create or switch to the branch `{branch}`.
2. Apply the code changes of the confirmed plan.
3. Run the test commands available in the affected projects.
4. Commit the changes and push the branch.
5. Write or update the report at `{report_path}` with: call-chain summary,
   root cause, fix plan, changed files, test results, and the commit link.

Avoid destructive operations: no force pushes, no history rewrites, no
deleting files outside the plan.
"#,
        step = Phase::Fix.step(),
    )
}
