use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tracing::debug;

use super::error::BackendError;
use super::traits::BackendGateway;
use super::types::{HealthReport, ServiceTag, UploadFile, UploadRecord};

type Predicate = Box<dyn Fn(&str, ServiceTag) -> bool + Send + Sync>;

/// One canned reply and the condition that selects it
pub struct ResponseRule {
    pub name: &'static str,
    predicate: Predicate,
    pub template: &'static str,
}

impl ResponseRule {
    pub fn new(
        name: &'static str,
        predicate: impl Fn(&str, ServiceTag) -> bool + Send + Sync + 'static,
        template: &'static str,
    ) -> Self {
        Self {
            name,
            predicate: Box::new(predicate),
            template,
        }
    }

    /// Rule that always matches; used as the last entry
    pub fn fallback(template: &'static str) -> Self {
        Self::new("default", |_, _| true, template)
    }

    pub fn matches(&self, query: &str, service: ServiceTag) -> bool {
        (self.predicate)(query, service)
    }
}

/// In-process backend that answers from a fixed rule list.
/// Rules are evaluated in order and the first match wins.
pub struct SimulatedGateway {
    rules: Vec<ResponseRule>,
    fallback: ResponseRule,
    latency: Duration,
    uploaded: parking_lot::Mutex<Vec<String>>,
}

impl SimulatedGateway {
    /// Gateway with the stock advisory rules
    pub fn new(latency: Duration) -> Self {
        Self::with_rules(default_rules(), ResponseRule::fallback(COMPREHENSIVE_ANALYSIS), latency)
    }

    pub fn with_rules(rules: Vec<ResponseRule>, fallback: ResponseRule, latency: Duration) -> Self {
        Self {
            rules,
            fallback,
            latency,
            uploaded: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Pick the reply for a query without waiting
    pub fn respond(&self, query: &str, service: ServiceTag) -> &'static str {
        let rule = self
            .rules
            .iter()
            .find(|rule| rule.matches(query, service))
            .unwrap_or(&self.fallback);
        debug!("Simulated backend matched rule '{}'", rule.name);
        rule.template
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

/// Case-insensitive whole-query keyword check
fn keyword(pattern: &str) -> Regex {
    // Patterns are literals defined in this file
    Regex::new(&format!("(?i){}", pattern)).expect("keyword pattern is valid")
}

fn default_rules() -> Vec<ResponseRule> {
    let invest = keyword("invest");
    let advisor = keyword("advisor");
    let research = keyword("market|trends");

    vec![
        ResponseRule::new(
            "investment",
            move |query, service| service == ServiceTag::Investment || invest.is_match(query),
            INVESTMENT_ANALYSIS,
        ),
        ResponseRule::new(
            "advisor",
            move |query, service| service == ServiceTag::Advisor || advisor.is_match(query),
            ADVISOR_RECOMMENDATIONS,
        ),
        ResponseRule::new(
            "research",
            move |query, service| service == ServiceTag::Research || research.is_match(query),
            MARKET_RESEARCH,
        ),
    ]
}

#[async_trait]
impl BackendGateway for SimulatedGateway {
    async fn chat(&self, message: &str, service: ServiceTag) -> Result<String, BackendError> {
        self.delay().await;
        Ok(self.respond(message, service).to_string())
    }

    async fn upload(&self, files: &[UploadFile]) -> Result<Vec<UploadRecord>, BackendError> {
        self.delay().await;
        let records: Vec<UploadRecord> = files
            .iter()
            .map(|f| UploadRecord {
                file_name: f.file_name.clone(),
            })
            .collect();
        self.uploaded
            .lock()
            .extend(records.iter().map(|r| r.file_name.clone()));
        Ok(records)
    }

    async fn health(&self) -> Result<HealthReport, BackendError> {
        Ok(HealthReport {
            status: Some("healthy".to_string()),
            agents_initialized: true,
        })
    }

    async fn initialize(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn list_files(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.uploaded.lock().clone())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

const INVESTMENT_ANALYSIS: &str = "**INVESTMENT ANALYSIS**

**YOUR INVESTMENT PROFILE:**
- Investment Amount: $50,000
- Risk Tolerance: Moderate
- Time Horizon: Long-term

**BALANCED STRATEGY:**
- Asset Allocation: 60% Stocks, 40% Bonds
- Focus: Growth and value mix with bond stability
- Recommended ETFs: VTI (Total Stock), BND (Total Bond)
- Expected Return: 6-8% annually

**DOLLAR ALLOCATION:**
- Stocks/Equity: $30,000
- Bonds/Fixed Income: $20,000

**IMPLEMENTATION STEPS:**
1. Open a low-cost brokerage account (Vanguard, Fidelity, Schwab)
2. Start with broad market index funds/ETFs
3. Set up automatic monthly investments
4. Review and rebalance quarterly

**Powered by:** Investment Agent + Market Analysis";

const ADVISOR_RECOMMENDATIONS: &str = "**ADVISOR RECOMMENDATIONS**

**TOP ADVISOR MATCHES**

**1. John Smith, CFP**
- Firm: Smith Financial
- Credentials: CFP, 15 years experience
- Specialization: Retirement Planning
- Location: Charlotte, NC
- Match Score: 95%

**2. Sarah Johnson, CFA**
- Firm: Johnson Wealth
- Credentials: CFA, ChFC, 12 years experience
- Specialization: Portfolio Management
- Location: Charlotte, NC
- Match Score: 92%

**3. Amanda Williams, ChFC**
- Firm: Williams Advisory Group
- Credentials: ChFC, CFP, 18 years experience
- Specialization: Estate Planning
- Location: Charlotte, NC
- Match Score: 88%

**NEXT STEPS:**
- Schedule initial consultations
- Ask about fee structures
- Verify credentials with FINRA

**Powered by:** MCP Advisor Database + Location Matching";

const MARKET_RESEARCH: &str = "**MARKET RESEARCH ANALYSIS**

**RENEWABLE ENERGY INVESTMENT TRENDS**

**Key Findings:**
- Clean energy investments reached $1.8T globally in 2024
- Solar and wind continue to dominate new capacity additions
- Battery storage market growing at 25% CAGR

**Investment Opportunities:**
- Renewable Energy ETFs: ICLN, QCLN, PBW
- Individual stocks: ENPH, SEDG, NEE
- Infrastructure REITs: BEP, NEP

**Market Outlook:**
- Government incentives driving growth
- Declining technology costs
- Corporate sustainability commitments

**Risk Factors:**
- Policy changes
- Supply chain disruptions
- Grid integration challenges

**Powered by:** Market Research Agent + Real-time Data";

const COMPREHENSIVE_ANALYSIS: &str = "**COMPREHENSIVE FINANCIAL ANALYSIS**

**INVESTMENT STRATEGY:**
Based on your query, I recommend a diversified approach with 60% stocks and 40% bonds for moderate risk tolerance.

**ADVISOR RECOMMENDATIONS:**
Found 3 qualified advisors in your area specializing in your needs.

**MARKET INSIGHTS:**
Current market conditions favor long-term investment strategies with focus on sustainable sectors.

**Integrated Guidance:** This analysis combines insights from 3 specialized financial experts to provide comprehensive guidance tailored to your needs.

**Powered by:** Smart Routing + Multi-Agent Analysis";
