//! Container names.

use std::sync::LazyLock;

use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;

/// Docker's limit on container name length.
pub const MAX_CONTAINER_NAME_LEN: usize = 128;

static CONTAINER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*$").expect("container name pattern is valid")
});

const ADJECTIVES: &[&str] = &[
    "agile", "bold", "brave", "bright", "brisk", "calm", "clever", "cosmic", "crisp", "daring",
    "eager", "fancy", "fierce", "gentle", "glad", "happy", "humble", "jolly", "keen", "lively",
    "lucky", "mellow", "nimble", "noble", "proud", "quick", "quiet", "rapid", "sharp", "shiny",
    "silent", "snappy", "steady", "sunny", "swift", "tidy", "vivid", "witty", "zesty", "zen",
];

const NOUNS: &[&str] = &[
    "badger", "beaver", "bison", "condor", "coyote", "crane", "dolphin", "falcon", "ferret",
    "gecko", "heron", "ibis", "jackal", "koala", "lemur", "lynx", "marmot", "marten", "moose",
    "narwhal", "ocelot", "orca", "otter", "panda", "pelican", "puffin", "quokka", "raven",
    "salmon", "seal", "sparrow", "stork", "tapir", "toucan", "turtle", "viper", "walrus",
    "wombat", "yak", "zebra",
];

/// Random `adjective-noun` name.
pub fn generate() -> String {
    generate_with(&mut rand::thread_rng())
}

fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("fresh");
    let noun = NOUNS.choose(rng).copied().unwrap_or("db");
    format!("{adjective}-{noun}")
}

/// Check that Docker will accept `name` for `--name`.
pub fn validate_container_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("container name can't be empty".to_string());
    }
    if name.chars().count() > MAX_CONTAINER_NAME_LEN {
        return Err(format!(
            "container name is too long (max {MAX_CONTAINER_NAME_LEN} chars)"
        ));
    }
    if !CONTAINER_NAME.is_match(name) {
        return Err(
            "container name must start with a letter or digit and contain only letters, \
             digits, '_', '.' or '-'"
                .to_string(),
        );
    }
    Ok(())
}
