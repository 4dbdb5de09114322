//! Category classifier for processes and browser domains
//!
//! Both lookup tables are immutable and injected at construction. Matching is
//! a case-insensitive substring test; the first matching rule wins.

use deskpulse_domain::{CategoryRule, Classification, ContextType, ResolvedApp};

/// Maps process names and web domains to a [`Classification`]
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryClassifier {
    process_rules: Vec<CategoryRule>,
    domain_rules: Vec<CategoryRule>,
}

impl CategoryClassifier {
    pub fn new(process_rules: Vec<CategoryRule>, domain_rules: Vec<CategoryRule>) -> Self {
        Self { process_rules, domain_rules }
    }

    /// Classifier with no rules; everything maps to the default category.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn classify_process(&self, process_name: &str) -> Classification {
        Self::lookup(&self.process_rules, process_name)
    }

    pub fn classify_domain(&self, domain: &str) -> Classification {
        Self::lookup(&self.domain_rules, domain)
    }

    /// Classify a resolved foreground app by process name, then by the file
    /// stem of its executable. Directory names never take part in matching.
    pub fn classify_app(&self, app: &ResolvedApp) -> Classification {
        let by_process = self.classify_process(&app.process_name);
        if by_process != Classification::default() {
            return by_process;
        }
        self.classify_process(executable_stem(&app.executable_path))
    }

    fn lookup(rules: &[CategoryRule], subject: &str) -> Classification {
        if subject.is_empty() {
            return Classification::default();
        }
        let subject = subject.to_lowercase();
        rules
            .iter()
            .find(|rule| subject.contains(rule.pattern.to_lowercase().as_str()))
            .map(|rule| Classification::new(rule.category.clone(), rule.context))
            .unwrap_or_default()
    }
}

/// File name of `path` without its extension, accepting either separator.
fn executable_stem(path: &str) -> &str {
    let file_name = path.rsplit(['\\', '/']).next().unwrap_or_default();
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new(default_process_rules(), default_domain_rules())
    }
}

/// Host part of `url`, or an empty string when the URL does not parse.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

pub fn default_process_rules() -> Vec<CategoryRule> {
    use ContextType::{
        Communication, Design, Development, Documentation, Entertainment, Meeting, Research,
        Utilities,
    };
    [
        ("code", "Development", Development),
        ("devenv", "Development", Development),
        ("idea", "Development", Development),
        ("pycharm", "Development", Development),
        ("rider", "Development", Development),
        ("clion", "Development", Development),
        ("sublime", "Development", Development),
        ("windowsterminal", "Development", Development),
        ("powershell", "Development", Development),
        ("cmd.exe", "Development", Development),
        ("git", "Development", Development),
        ("postman", "Development", Development),
        ("winword", "Documents", Documentation),
        ("excel", "Documents", Documentation),
        ("powerpnt", "Documents", Documentation),
        ("onenote", "Documents", Documentation),
        ("notion", "Documents", Documentation),
        ("obsidian", "Documents", Documentation),
        ("acrord", "Documents", Documentation),
        ("figma", "Design", Design),
        ("photoshop", "Design", Design),
        ("illustrator", "Design", Design),
        ("blender", "Design", Design),
        ("teams", "Meetings", Meeting),
        ("zoom", "Meetings", Meeting),
        ("webex", "Meetings", Meeting),
        ("slack", "Communication", Communication),
        ("discord", "Communication", Communication),
        ("outlook", "Communication", Communication),
        ("thunderbird", "Communication", Communication),
        ("telegram", "Communication", Communication),
        ("chrome", "Browsing", Research),
        ("firefox", "Browsing", Research),
        ("msedge", "Browsing", Research),
        ("brave", "Browsing", Research),
        ("spotify", "Entertainment", Entertainment),
        ("vlc", "Entertainment", Entertainment),
        ("steam", "Entertainment", Entertainment),
        ("explorer", "System", Utilities),
        ("taskmgr", "System", Utilities),
        ("notepad", "System", Utilities),
    ]
    .into_iter()
    .map(|(pattern, category, context)| CategoryRule::new(pattern, category, context))
    .collect()
}

pub fn default_domain_rules() -> Vec<CategoryRule> {
    use ContextType::{
        Communication, Development, Documentation, Entertainment, Meeting, News, Research,
        Shopping, SocialMedia,
    };
    [
        ("github.com", "Development", Development),
        ("gitlab.com", "Development", Development),
        ("stackoverflow.com", "Development", Development),
        ("crates.io", "Development", Development),
        ("docs.rs", "Documentation", Documentation),
        ("developer.mozilla.org", "Documentation", Documentation),
        ("learn.microsoft.com", "Documentation", Documentation),
        ("docs.google.com", "Documentation", Documentation),
        ("wikipedia.org", "Research", Research),
        ("scholar.google", "Research", Research),
        ("arxiv.org", "Research", Research),
        ("mail.google.com", "Communication", Communication),
        ("meet.google.com", "Meetings", Meeting),
        ("google.", "Search", Research),
        ("bing.com", "Search", Research),
        ("duckduckgo.com", "Search", Research),
        ("outlook.", "Communication", Communication),
        ("slack.com", "Communication", Communication),
        ("zoom.us", "Meetings", Meeting),
        ("news.ycombinator.com", "News", News),
        ("bbc.", "News", News),
        ("cnn.com", "News", News),
        ("reddit.com", "Social Media", SocialMedia),
        ("twitter.com", "Social Media", SocialMedia),
        ("facebook.com", "Social Media", SocialMedia),
        ("instagram.com", "Social Media", SocialMedia),
        ("linkedin.com", "Social Media", SocialMedia),
        ("amazon.", "Shopping", Shopping),
        ("ebay.", "Shopping", Shopping),
        ("youtube.com", "Entertainment", Entertainment),
        ("netflix.com", "Entertainment", Entertainment),
        ("twitch.tv", "Entertainment", Entertainment),
    ]
    .into_iter()
    .map(|(pattern, category, context)| CategoryRule::new(pattern, category, context))
    .collect()
}
