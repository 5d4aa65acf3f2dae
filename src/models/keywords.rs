//! 关键词集合
//!
//! 固定顺序的大写短语列表，顺序决定多条命中时的输出顺序

use regex::RegexSet;

/// 内置关键词
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "ENVIO CV TM SIN ESCRITURA",
    "ENVIO PH TM SIN ESCRITURA",
    "ENVIO RAT TM SIN ESCRITURA",
    "ENVIO NOV TM SIN ESCRITURA",
    "ENVIO CPH TM SIN ESCRITURA",
    "ENVIO AE TM SIN ESCRITURA",
    "ENVIO ATO TM SIN ESCRITURA",
    "ENVIO SUB TM SIN ESCRITURA",
    "ENVIO SUS TM SIN ESCRITURA",
    "ENVIO AMP TM SIN ESCRITURA",
    "ENVIO CCR TM SIN ESCRITURA",
    "ENVIO DON TM SIN ESCRITURA",
    "ENVIO ACT TM SIN ESCRITURA",
    "ENVIO MOR TM SIN ESCRITURA",
    "ENVIO PPR TM SIN ESCRITURA",
    "ENVIO LD TM SIN ESCRITURA",
    "ENVIO AGR TM SIN ESCRITURA",
    "ENVIO RUS TM SIN ESCRITURA",
    "ENVIO COM TM SIN ESCRITURA",
    "ENVIO SEP TM SIN ESCRITURA",
    "ENVIO EXC TM SIN ESCRITURA",
    "ENVIO APO TM SIN ESCRITURA",
    "ENVIO LSG TM SIN ESCRITURA",
    "ENVIO HER TM SIN ESCRITURA",
    "ENVIO DNC TM SIN ESCRITURA",
    "ENVIO APS TM SIN ESCRITURA",
    "ENVIO ODC TM SIN ESCRITURA",
    "ENVIO EXP TM SIN ESCRITURA",
    "ENVIO CE TM SIN ESCRITURA",
];

/// 关键词集合
///
/// 预编译成一个 `RegexSet`，一次扫描即可得到所有命中的短语。
/// 互相包含的短语（如 `ENVIO RAT TM` 与 `ENVIO RAT TM SIN ESCRITURA`）会同时命中，不做去重
#[derive(Debug, Clone)]
pub struct KeywordSet {
    phrases: Vec<String>,
    matcher: RegexSet,
}

impl KeywordSet {
    /// 由任意短语列表创建
    ///
    /// 短语会被去空白并转大写，空短语丢弃，完全重复的只保留第一次出现
    pub fn new<I, S>(phrases: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for phrase in phrases {
            let phrase = phrase.as_ref().trim().to_uppercase();
            if !phrase.is_empty() && !normalized.contains(&phrase) {
                normalized.push(phrase);
            }
        }

        let patterns = normalized
            .iter()
            .map(|p| format!("(?i){}", regex::escape(p)));
        let matcher = RegexSet::new(patterns)?;

        Ok(Self {
            phrases: normalized,
            matcher,
        })
    }

    /// 内置关键词集合
    pub fn builtin() -> Result<Self, regex::Error> {
        Self::new(DEFAULT_KEYWORDS)
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// 返回文本中出现的所有短语（按集合顺序，而不是出现顺序）
    pub fn classify(&self, text: &str) -> Vec<String> {
        let normalized = text.to_uppercase();
        // SetMatches 按模式下标升序迭代
        self.matcher
            .matches(&normalized)
            .into_iter()
            .map(|idx| self.phrases[idx].clone())
            .collect()
    }
}
