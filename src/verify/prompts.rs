pub const SYSTEM_INSTRUCTION: &str = "You are an AI assistant designed to analyze the validity of news. \
Your responses should be concise, formatted as bullet points, and avoid any additional commentary. \
Maintain a neutral and objective tone, ensuring that each assumption is framed as a question that \
can be directly queried online.";

pub const NO_ASSUMPTIONS_MESSAGE: &str = "No assertions generated. Cannot proceed.";

/// Ask for a bullet list of yes/no questions behind `statement`.
pub fn assumptions_prompt(statement: &str) -> String {
    format!(
        r#"Here is a statement:
{statement}
Make a bullet point list of the assumptions you made when given the above statement.
These assumptions will then be used to check online for the validity of the statement.
Only Give Bullet Points, No Other Text

Example:

Input:
deepseek company is owned by elon musk

Output:
* Does elon musk own deepseek?
* Does Elon Musk have any publicly known business interests or holdings that could include a company named "Deepseek"?
* Are there any news articles, press releases, or official statements confirming Elon Musk's ownership of "Deepseek"?
* Do any financial databases or corporate registries list Elon Musk as an owner or shareholder of "Deepseek"?
"#
    )
}

/// Cross-check one assumption against the content of its top search hit.
pub fn evaluation_prompt(assumption: &str, content: &str, statement: &str) -> String {
    format!(
        r#"Here is a statement:
{assumption}

Carefully analyze the correctness of this statement using the provided information gathered from the internet:
{content}

### Step-by-Step Evaluation:
1. Identify the key claims made in the statement.
2. Cross-check these claims with the provided context and assess whether they align with verified information.
3. Consider any contradictions or missing details that might affect the validity of the statement.
4. Based on your reasoning, determine whether:
```{statement}``` is Real News or Fake News.

### Final Decision:
- If the above news is Real News then output *TRUE* else output *FALSE*.

Provide your reasoning along with the final answer and include the source URL of the data.
"#
    )
}

/// Merge per-assumption reasoning into one narrative ending in a marker line.
pub fn synthesis_prompt(reasoning: &[String]) -> String {
    let combined = reasoning.join("\n\n");
    format!(
        r#"
General Prompt:

You are provided with a list of reasoning steps, where each step includes its chain-of-thought and a preliminary conclusion
regarding the veracity of a news item (either "FAKE" or "REAL"). Your task is to synthesize these individual steps into a cohesive
overall reasoning narrative, and provide a final verdict on whether the news is FAKE or REAL.

Instructions:

1. Read and understand each reasoning step below.
2. Extract key evidence and conclusions.
3. Combine these pieces into a single comprehensive chain-of-thought.
4. Decide if the news is FAKE or REAL.
5. Clearly justify your final decision in the combined narrative.
6. Write the reasoning in such a way that people can easily understand.

Output Format:
Your final output should contain two sections:
Overall Reasoning: A detailed explanation that synthesizes the evidence and logic.
Final Result: A clear statement indicating either "FAKE" or "REAL".

Example Output:

Final Result: [FAKE or REAL]

Overall Reasoning: [Detailed explanation combining evidence and reasoning.]

Reasoning Steps:
{combined}
"#
    )
}
