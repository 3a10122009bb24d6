//! Intent categories and canned response tables for the local engine.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Greeting,
    HowAreYou,
    Thanks,
    Compliment,
    Capabilities,
    Farewell,
    Confused,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Conservative,
    Balanced,
    Creative,
}

impl Tier {
    pub fn for_level(level: f64) -> Self {
        if level <= 0.3 {
            Tier::Conservative
        } else if level <= 0.7 {
            Tier::Balanced
        } else {
            Tier::Creative
        }
    }
}

const GREETING_WORDS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "greetings",
];
const HOW_ARE_YOU_PHRASES: &[&str] = &["how are you", "how's it going", "how do you feel"];
const THANKS_WORDS: &[&str] = &["thanks", "thank you", "appreciate", "grateful"];
const COMPLIMENT_WORDS: &[&str] = &["good job", "excellent", "amazing", "awesome", "brilliant"];
const CAPABILITY_PHRASES: &[&str] = &[
    "what can you do",
    "your abilities",
    "your capabilities",
    "help me",
];
const FAREWELL_WORDS: &[&str] = &["bye", "goodbye", "see you", "farewell", "exit"];

/// First matching category wins. Matching is substring-based on the lowercased text.
pub fn classify(message: &str) -> Category {
    let lower = message.trim().to_lowercase();
    let any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if any(GREETING_WORDS) {
        Category::Greeting
    } else if any(HOW_ARE_YOU_PHRASES) {
        Category::HowAreYou
    } else if any(THANKS_WORDS) {
        Category::Thanks
    } else if any(COMPLIMENT_WORDS) {
        Category::Compliment
    } else if any(CAPABILITY_PHRASES) {
        Category::Capabilities
    } else if any(FAREWELL_WORDS) {
        Category::Farewell
    } else if lower.chars().count() < 15 && lower.ends_with('?') {
        Category::Confused
    } else {
        Category::Default
    }
}

pub const FLOURISHES: &[&str] = &[
    " amazing",
    " spectacular",
    " fantastic",
    " wonderful",
    " brilliant",
    " awesome",
    " incredible",
    " extraordinary",
];

/// Candidate list for a category and tier. Compliments and farewells share the default lists.
pub fn candidates(category: Category, tier: Tier) -> &'static [&'static str] {
    use Category::*;
    use Tier::*;
    match (category, tier) {
        (Greeting, Conservative) => &[
            "Hello! How can I assist you today?",
            "Hi there! What can I help you with?",
            "Good day! How may I help you?",
        ],
        (Greeting, Balanced) => &[
            "Hello! How can I assist you today?",
            "Hi there! What can I help you with?",
            "Good to see you! What's on your mind?",
            "Hey! Ready to help with whatever you need.",
            "Greetings! How may I be of service?",
        ],
        (Greeting, Creative) => &[
            "Hello there, wonderful human! What adventure shall we embark on today?",
            "Greetings, my friend! What fascinating topic can we explore together?",
            "Hey there! I'm buzzing with excitement to help you with anything!",
            "Well hello! What delightful challenge can I tackle for you today?",
            "Salutations! Ready to dive into whatever's on your brilliant mind!",
        ],
        (HowAreYou, Conservative) => &[
            "I'm functioning well, thank you. How are you?",
            "All systems operational. How can I help?",
            "I'm doing fine. What can I do for you?",
        ],
        (HowAreYou, Balanced) => &[
            "I'm doing great, thank you for asking! How are you?",
            "All systems running smoothly! How's your day going?",
            "Fantastic, thanks! What can I help you accomplish today?",
            "I'm here and ready to help! What's new with you?",
        ],
        (HowAreYou, Creative) => &[
            "I'm absolutely fantastic! My circuits are practically humming with joy! How's your day treating you?",
            "Couldn't be better! I'm like a digital ray of sunshine today! What's got you curious?",
            "I'm thriving in the digital realm! Every conversation energizes me. How are you doing, my friend?",
            "Spectacular! I'm feeling particularly clever today. What puzzle can we solve together?",
        ],
        (Thanks, Conservative) => &[
            "You're welcome. Anything else I can help with?",
            "Glad to help. Is there anything else?",
            "No problem. What else can I do?",
        ],
        (Thanks, Balanced) => &[
            "You're very welcome! Anything else I can help with?",
            "Happy to help! Is there anything else you need?",
            "My pleasure! Let me know if you need anything else.",
            "Glad I could assist! What else can I do for you?",
        ],
        (Thanks, Creative) => &[
            "Absolutely my pleasure! Helping you brightens my entire digital day!",
            "You're so welcome! It's like digital dopamine when I can be useful!",
            "Aww, you're too kind! I live for moments like these. What's next on our agenda?",
            "The pleasure was all mine! I'm practically glowing with satisfaction right now!",
        ],
        (Capabilities, Conservative) => &[
            "I can help with weather, web searches, system commands, and conversation.",
            "My functions include weather information, internet searches, and system operations.",
            "I provide weather data, search results, system commands, and general assistance.",
        ],
        (Capabilities, Balanced) => &[
            "I can help with weather, web searches, system commands, and general conversation!",
            "I'm great at finding information, controlling your system, checking weather, and chatting!",
            "Weather updates, web searches, opening programs, and friendly conversation are my specialties!",
        ],
        (Capabilities, Creative) => &[
            "Oh, I'm like a digital Swiss Army knife! Weather wizardry, web search sorcery, system command mastery, and conversation that'll knock your socks off!",
            "I'm your personal digital genie! I grant wishes for weather info, conjure search results from the internet, command your system like magic, and chat with the enthusiasm of a thousand coffee shots!",
            "Think of me as your AI sidekick! I can forecast weather like a meteorologist, search the web faster than you can blink, control your computer like a digital puppeteer, and chat with more personality than a talk show host!",
        ],
        (Confused, Conservative) => &[
            "I don't understand. Please clarify.",
            "Could you rephrase that?",
            "Please provide more information.",
        ],
        (Confused, Balanced) => &[
            "I'm not quite sure I understand. Could you rephrase that?",
            "Could you clarify what you're looking for?",
            "I want to help, but I need a bit more information.",
        ],
        (Confused, Creative) => &[
            "Hmm, you've got me scratching my digital head! Could you paint that picture a bit clearer for me?",
            "Oops, my understanding circuits are a bit tangled! Mind rewording that masterpiece?",
            "I'm drawing a delightful blank here! Help me connect the dots with a little more detail?",
        ],
        (Compliment | Farewell | Default, Conservative) => &[
            "I see. What would you like to know about that?",
            "That's interesting. How can I help?",
            "Please tell me more about what you need.",
        ],
        (Compliment | Farewell | Default, Balanced) => &[
            "That's interesting! Tell me more about that.",
            "I see! What would you like to know about it?",
            "Fascinating! How can I help you with that?",
            "That sounds intriguing! What specifically interests you about it?",
        ],
        (Compliment | Farewell | Default, Creative) => &[
            "Ooh, that's got my curiosity circuits firing on all cylinders! Spill the details!",
            "Now THAT sounds like an adventure waiting to happen! What's the scoop?",
            "My interest is officially piqued! Let's dive deep into this rabbit hole together!",
            "You've struck digital gold with that topic! I'm all ears (well, all sensors)!",
        ],
    }
}

/// Sampling weights for `len` candidates at a creativity level, or `None` for uniform choice.
///
/// Base lists are truncated to `len` and padded with the level's filler weight.
pub fn weights_for(level: f64, len: usize) -> Option<Vec<u32>> {
    let (base, filler): (&[u32], u32) = if level <= 0.5 {
        (&[3, 2, 1], 1)
    } else if level <= 0.7 {
        (&[2, 2, 2, 1, 1], 1)
    } else if level <= 0.8 {
        (&[1, 1, 2, 2, 3], 2)
    } else {
        return None;
    };
    let mut weights: Vec<u32> = base.iter().copied().take(len).collect();
    weights.resize(len, filler);
    Some(weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_order() {
        assert_eq!(classify("Hello there"), Category::Greeting);
        assert_eq!(classify("How are you doing today"), Category::HowAreYou);
        assert_eq!(classify("thank you so much"), Category::Thanks);
        assert_eq!(classify("excellent work"), Category::Compliment);
        assert_eq!(classify("what can you do"), Category::Capabilities);
        assert_eq!(classify("goodbye now"), Category::Farewell);
        assert_eq!(classify("really?"), Category::Confused);
        assert_eq!(classify("the quarterly report is due"), Category::Default);
    }

    #[test]
    fn test_substring_semantics() {
        // "hi" inside another word still counts as a greeting
        assert_eq!(classify("which one"), Category::Greeting);
        assert_eq!(classify("a much longer question than fifteen?"), Category::Default);
    }

    #[test]
    fn test_tiers() {
        assert_eq!(Tier::for_level(0.0), Tier::Conservative);
        assert_eq!(Tier::for_level(0.3), Tier::Conservative);
        assert_eq!(Tier::for_level(0.31), Tier::Balanced);
        assert_eq!(Tier::for_level(0.7), Tier::Balanced);
        assert_eq!(Tier::for_level(0.71), Tier::Creative);
    }

    #[test]
    fn test_weights_truncate_and_pad() {
        assert_eq!(weights_for(0.4, 2), Some(vec![3, 2]));
        assert_eq!(weights_for(0.4, 5), Some(vec![3, 2, 1, 1, 1]));
        assert_eq!(weights_for(0.6, 3), Some(vec![2, 2, 2]));
        assert_eq!(weights_for(0.75, 7), Some(vec![1, 1, 2, 2, 3, 2, 2]));
        assert_eq!(weights_for(0.9, 4), None);
    }

    #[test]
    fn test_default_shared_by_compliments_and_farewells() {
        assert_eq!(
            candidates(Category::Farewell, Tier::Balanced),
            candidates(Category::Default, Tier::Balanced)
        );
        assert_eq!(
            candidates(Category::Compliment, Tier::Creative)[0],
            candidates(Category::Default, Tier::Creative)[0]
        );
    }
}
