//! Indicator templates for Python strategy generation
//!
//! Each indicator implements `IndicatorTemplate` to describe the dataframe
//! column it produces and the `populate_indicators` lines that compute it.

pub const MIN_PERIOD: u32 = 1;
pub const MAX_PERIOD: u32 = 500;

/// Mapping of one indicator onto the generated Python strategy
pub trait IndicatorTemplate: Send + Sync {
    /// Canonical upper-case name
    fn name(&self) -> &'static str;

    /// Alternative names accepted from users
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn default_period(&self) -> u32 {
        14
    }

    /// Whether the period changes the generated code
    fn uses_period(&self) -> bool {
        true
    }

    /// Whether any explicit period is accepted without a range check
    fn accepts_any_period(&self) -> bool {
        false
    }

    /// Dataframe column holding the indicator value
    fn column(&self, period: u32) -> String;

    /// Python lines for populate_indicators
    fn populate_lines(&self, period: u32) -> Vec<String>;

    fn matches(&self, name: &str) -> bool {
        let upper = name.trim().to_uppercase();
        upper == self.name() || self.aliases().iter().any(|a| *a == upper)
    }
}

pub struct RsiTemplate;

impl IndicatorTemplate for RsiTemplate {
    fn name(&self) -> &'static str {
        "RSI"
    }

    fn column(&self, period: u32) -> String {
        format!("rsi_{}", period)
    }

    fn populate_lines(&self, period: u32) -> Vec<String> {
        vec![format!("dataframe['rsi_{0}'] = ta.RSI(dataframe, timeperiod={0})", period)]
    }
}

pub struct SmaTemplate;

impl IndicatorTemplate for SmaTemplate {
    fn name(&self) -> &'static str {
        "SMA"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["MA"]
    }

    fn default_period(&self) -> u32 {
        20
    }

    fn column(&self, period: u32) -> String {
        format!("sma_{}", period)
    }

    fn populate_lines(&self, period: u32) -> Vec<String> {
        vec![format!("dataframe['sma_{0}'] = ta.SMA(dataframe, timeperiod={0})", period)]
    }
}

pub struct EmaTemplate;

impl IndicatorTemplate for EmaTemplate {
    fn name(&self) -> &'static str {
        "EMA"
    }

    fn default_period(&self) -> u32 {
        20
    }

    fn column(&self, period: u32) -> String {
        format!("ema_{}", period)
    }

    fn populate_lines(&self, period: u32) -> Vec<String> {
        vec![format!("dataframe['ema_{0}'] = ta.EMA(dataframe, timeperiod={0})", period)]
    }
}

fn macd_lines() -> Vec<String> {
    vec![
        "macd = ta.MACD(dataframe, fastperiod=12, slowperiod=26, signalperiod=9)".to_string(),
        "dataframe['macd'] = macd['macd']".to_string(),
        "dataframe['macdsignal'] = macd['macdsignal']".to_string(),
        "dataframe['macdhist'] = macd['macdhist']".to_string(),
    ]
}

/// MACD line with the standard 12/26/9 setup
pub struct MacdTemplate;

impl IndicatorTemplate for MacdTemplate {
    fn name(&self) -> &'static str {
        "MACD"
    }

    fn uses_period(&self) -> bool {
        false
    }

    fn column(&self, _period: u32) -> String {
        "macd".to_string()
    }

    fn populate_lines(&self, _period: u32) -> Vec<String> {
        macd_lines()
    }
}

pub struct MacdSignalTemplate;

impl IndicatorTemplate for MacdSignalTemplate {
    fn name(&self) -> &'static str {
        "MACD_SIGNAL"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["MACDSIGNAL"]
    }

    fn uses_period(&self) -> bool {
        false
    }

    fn column(&self, _period: u32) -> String {
        "macdsignal".to_string()
    }

    fn populate_lines(&self, _period: u32) -> Vec<String> {
        macd_lines()
    }
}

/// Position of the close inside the bands, 0 = lower band, 1 = upper band
pub struct BollingerTemplate;

impl IndicatorTemplate for BollingerTemplate {
    fn name(&self) -> &'static str {
        "BOLLINGER"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["BB", "BBANDS", "BOLLINGER BANDS"]
    }

    fn default_period(&self) -> u32 {
        20
    }

    fn column(&self, period: u32) -> String {
        format!("bb_percent_{}", period)
    }

    fn populate_lines(&self, period: u32) -> Vec<String> {
        vec![
            format!("bollinger_{0} = ta.BBANDS(dataframe, timeperiod={0}, nbdevup=2, nbdevdn=2)", period),
            format!(
                "dataframe['bb_percent_{0}'] = (dataframe['close'] - bollinger_{0}['lowerband']) / (bollinger_{0}['upperband'] - bollinger_{0}['lowerband'])",
                period
            ),
        ]
    }
}

pub struct AdxTemplate;

impl IndicatorTemplate for AdxTemplate {
    fn name(&self) -> &'static str {
        "ADX"
    }

    fn column(&self, period: u32) -> String {
        format!("adx_{}", period)
    }

    fn populate_lines(&self, period: u32) -> Vec<String> {
        vec![format!("dataframe['adx_{0}'] = ta.ADX(dataframe, timeperiod={0})", period)]
    }
}

pub struct StochasticTemplate;

impl IndicatorTemplate for StochasticTemplate {
    fn name(&self) -> &'static str {
        "STOCHASTIC"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["STOCH"]
    }

    fn column(&self, period: u32) -> String {
        format!("stoch_k_{}", period)
    }

    fn populate_lines(&self, period: u32) -> Vec<String> {
        vec![
            format!("stoch_{0} = ta.STOCH(dataframe, fastk_period={0}, slowk_period=3, slowd_period=3)", period),
            format!("dataframe['stoch_k_{0}'] = stoch_{0}['slowk']", period),
        ]
    }
}

pub struct AtrTemplate;

impl IndicatorTemplate for AtrTemplate {
    fn name(&self) -> &'static str {
        "ATR"
    }

    fn column(&self, period: u32) -> String {
        format!("atr_{}", period)
    }

    fn populate_lines(&self, period: u32) -> Vec<String> {
        vec![format!("dataframe['atr_{0}'] = ta.ATR(dataframe, timeperiod={0})", period)]
    }
}

/// Raw close price, already present in the dataframe
pub struct CloseTemplate;

impl IndicatorTemplate for CloseTemplate {
    fn name(&self) -> &'static str {
        "CLOSE"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["PRICE"]
    }

    fn uses_period(&self) -> bool {
        false
    }

    fn accepts_any_period(&self) -> bool {
        true
    }

    fn column(&self, _period: u32) -> String {
        "close".to_string()
    }

    fn populate_lines(&self, _period: u32) -> Vec<String> {
        Vec::new()
    }
}

/// Registry of all indicator templates
pub struct IndicatorRegistry {
    templates: Vec<Box<dyn IndicatorTemplate>>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        let mut registry = Self { templates: Vec::new() };

        registry.register(Box::new(RsiTemplate));
        registry.register(Box::new(SmaTemplate));
        registry.register(Box::new(EmaTemplate));
        registry.register(Box::new(MacdTemplate));
        registry.register(Box::new(MacdSignalTemplate));
        registry.register(Box::new(BollingerTemplate));
        registry.register(Box::new(AdxTemplate));
        registry.register(Box::new(StochasticTemplate));
        registry.register(Box::new(AtrTemplate));
        registry.register(Box::new(CloseTemplate));

        registry
    }

    pub fn register(&mut self, template: Box<dyn IndicatorTemplate>) {
        self.templates.push(template);
    }

    pub fn get(&self, name: &str) -> Option<&dyn IndicatorTemplate> {
        self.templates.iter().find(|t| t.matches(name)).map(|t| t.as_ref())
    }

    /// Canonical names, in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.templates.iter().map(|t| t.name()).collect()
    }
}

impl Default for IndicatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
