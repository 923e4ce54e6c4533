use std::collections::HashSet;

use regex::Regex;

use crate::models::ArticleDraft;

/// Categories whose sources emit a lot of off-topic content; articles from
/// them need a keyword-category match before they are stored.
pub const BROAD_CATEGORIES: &[&str] = &["Internet", "Technology", "Startup & Product"];

pub fn is_broad_category(name: &str) -> bool {
    BROAD_CATEGORIES.contains(&name)
}

/// Keyword classifier and batch dedup filter.
///
/// All tables are read-only after construction. Matching is lowercase
/// substring containment, which is case-insensitive for latin-script
/// keywords and exact substring for CJK keywords.
pub struct Classifier {
    categories: Vec<(String, Vec<String>)>,
    blacklist: Vec<String>,
    tech_overrides: Vec<String>,
    entity_re: Regex,
}

impl Classifier {
    pub fn new(
        categories: Vec<(String, Vec<String>)>,
        blacklist: Vec<String>,
        tech_overrides: Vec<String>,
    ) -> Self {
        let categories = categories
            .into_iter()
            .map(|(name, keywords)| {
                let keywords = keywords.into_iter().map(|k| k.to_lowercase()).collect();
                (name, keywords)
            })
            .collect();
        let blacklist = blacklist.into_iter().map(|k| k.to_lowercase()).collect();
        let tech_overrides = tech_overrides.into_iter().map(|k| k.to_lowercase()).collect();

        Self {
            categories,
            blacklist,
            tech_overrides,
            entity_re: Regex::new(
                r"(?i)\b(Google|Alphabet|Microsoft|Amazon|Apple|Meta|Facebook|Tesla|SpaceX|Netflix|Uber|Airbnb|Stripe|Salesforce|Oracle|IBM|Intel|AMD|NVIDIA|OpenAI|Anthropic)\b",
            )
            .expect("invalid entity regex"),
        }
    }

    /// Highest keyword-hit category; ties keep the first-seen category in
    /// table order; zero hits yields None.
    pub fn categorize(&self, title: &str, text: &str) -> Option<&str> {
        let haystack = format!("{} {}", title, text).to_lowercase();

        let mut best: Option<&str> = None;
        let mut best_score = 0usize;

        for (name, keywords) in &self.categories {
            let score = keywords.iter().filter(|k| haystack.contains(k.as_str())).count();
            if score > best_score {
                best_score = score;
                best = Some(name.as_str());
            }
        }

        best
    }

    /// A blacklisted title is noise unless a tech-override term is also
    /// present, in which case tech relevance wins.
    pub fn is_financial_noise(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        if !self.blacklist.iter().any(|k| title.contains(k.as_str())) {
            return false;
        }
        !self.tech_overrides.iter().any(|k| title.contains(k.as_str()))
    }

    /// Every category with at least one keyword hit, plus up to three unique
    /// company-entity matches.
    pub fn extract_tags(&self, title: &str, text: &str) -> Vec<String> {
        let haystack = format!("{} {}", title, text).to_lowercase();
        let mut tags: Vec<String> = Vec::new();

        for (name, keywords) in &self.categories {
            if keywords.iter().any(|k| haystack.contains(k.as_str())) {
                tags.push(name.clone());
            }
        }

        let original = format!("{} {}", title, text);
        let mut seen = HashSet::new();
        let mut entities = 0usize;
        for cap in self.entity_re.find_iter(&original) {
            if entities >= 3 {
                break;
            }
            let entity = cap.as_str().to_string();
            if seen.insert(entity.to_lowercase()) {
                tags.push(entity);
                entities += 1;
            }
        }

        tags
    }

    /// Dedup key for titles: lowercase, punctuation stripped (latin and CJK),
    /// whitespace collapsed.
    pub fn normalize_title(&self, title: &str) -> String {
        let lowered = title.to_lowercase();
        let stripped: String = lowered
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect();
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Single-pass batch dedup: drop a draft whose GUID or normalized title
    /// was already seen. Order-preserving, first occurrence wins.
    pub fn remove_duplicates(&self, drafts: Vec<ArticleDraft>) -> Vec<ArticleDraft> {
        let mut seen_guids: HashSet<String> = HashSet::new();
        let mut seen_titles: HashSet<String> = HashSet::new();
        let mut unique = Vec::with_capacity(drafts.len());

        for draft in drafts {
            if !draft.guid.is_empty() && seen_guids.contains(&draft.guid) {
                continue;
            }
            let title_key = self.normalize_title(&draft.title);
            if seen_titles.contains(&title_key) {
                continue;
            }
            if !draft.guid.is_empty() {
                seen_guids.insert(draft.guid.clone());
            }
            seen_titles.insert(title_key);
            unique.push(draft);
        }

        unique
    }

    /// Character-set Jaccard similarity at or above `threshold`. Advisory
    /// only; not part of the ingestion filter path.
    pub fn is_duplicate_content(&self, a: &str, b: &str, threshold: f64) -> bool {
        if a.is_empty() || b.is_empty() {
            return false;
        }

        let set_a: HashSet<char> = a.to_lowercase().chars().collect();
        let set_b: HashSet<char> = b.to_lowercase().chars().collect();

        let intersection = set_a.intersection(&set_b).count();
        let union = set_a.union(&set_b).count();
        if union == 0 {
            return false;
        }

        intersection as f64 / union as f64 >= threshold
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            default_category_keywords(),
            default_blacklist(),
            default_tech_overrides(),
        )
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Bilingual keyword tables for the seeded categories. Order matters: ties in
/// categorize() keep the first-seen category.
fn default_category_keywords() -> Vec<(String, Vec<String>)> {
    vec![
        (
            "AI".to_string(),
            strings(&[
                "人工智能", "大模型", "机器学习", "深度学习", "神经网络", "生成式", "智能体",
                "多模态", "chatgpt", "gpt-", "llm", "openai", "anthropic", "claude", "gemini",
                "artificial intelligence", "machine learning", "deep learning", "neural network",
                "large language model", "generative ai",
            ]),
        ),
        (
            "Technology".to_string(),
            strings(&[
                "科技", "芯片", "半导体", "硬件", "处理器", "量子计算", "机器人", "自动驾驶",
                "semiconductor", "hardware", "processor", "quantum computing", "robotics",
                "consumer electronics",
            ]),
        ),
        (
            "Internet".to_string(),
            strings(&[
                "互联网", "电商", "社交媒体", "短视频", "直播", "平台经济", "搜索引擎",
                "e-commerce", "social media", "search engine", "streaming platform",
            ]),
        ),
        (
            "Developer".to_string(),
            strings(&[
                "编程", "开发者", "开源", "代码", "框架", "编程语言", "编译器", "工具链",
                "github", "rust", "python", "javascript", "typescript", "programming language",
                "open source", "developer tools", "sdk",
            ]),
        ),
        (
            "Cloud & DevOps".to_string(),
            strings(&[
                "云计算", "云服务", "容器", "微服务", "基础设施", "kubernetes", "docker",
                "devops", "serverless", "ci/cd", "cloud computing", "cloud native",
            ]),
        ),
        (
            "Cybersecurity".to_string(),
            strings(&[
                "网络安全", "安全漏洞", "数据泄露", "黑客", "勒索软件", "钓鱼", "隐私",
                "security vulnerability", "ransomware", "phishing", "data breach", "zero-day",
                "exploit",
            ]),
        ),
        (
            "Startup & Product".to_string(),
            strings(&[
                "创业", "融资", "独角兽", "风投", "天使轮", "估值", "产品发布",
                "startup", "funding round", "venture capital", "unicorn", "seed round",
                "product launch",
            ]),
        ),
    ]
}

/// Financial-market noise that keyword sources routinely emit.
fn default_blacklist() -> Vec<String> {
    strings(&[
        "涨停", "跌停", "概念股", "股价", "股市", "大盘", "财报", "分红", "派息", "市值",
        "a股", "港股", "美股", "券商", "基金", "证券", "打新",
        "earnings report", "dividend", "stock price", "share price", "market cap",
    ])
}

/// Terms that rescue a blacklisted title; tech relevance wins.
fn default_tech_overrides() -> Vec<String> {
    strings(&[
        "ai", "人工智能", "大模型", "芯片", "半导体", "算力", "机器人", "自动驾驶",
        "云计算", "开源",
    ])
}
