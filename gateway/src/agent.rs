use shoe_core::Agent;
use shoe_tools::{lookup_faq_tool, FaqLookup};

pub const AGENT_NAME: &str = "Shoe Brand Agent";

pub const INSTRUCTIONS: &str = "You are the support & catalog agent for our shoe brand. \
For FAQs, policies, campaigns or promotions, call the `lookup_faq` tool. \
Answer clearly and keep it brand-consistent.";

// Catalog lookups would register here as a second tool.
pub fn shoe_brand_agent(faq: FaqLookup) -> Agent {
    Agent::new(AGENT_NAME, INSTRUCTIONS).with_tool(lookup_faq_tool(faq))
}
