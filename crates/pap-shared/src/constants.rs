/// Application name
pub const APP_NAME: &str = "PeopleAndPlaces";

/// Maximum length of an account name or password, in characters
pub const MAX_CREDENTIAL_LEN: usize = 32;

/// Maximum length of a free-text contact field, in characters
pub const MAX_CONTACT_FIELD_LEN: usize = 64;

/// Maximum length of an event label, in characters
pub const MAX_EVENT_LABEL_LEN: usize = 256;

/// Number of digits in a normalized phone number (country digit included)
pub const PHONE_DIGITS: usize = 11;

/// Largest response accepted from a single read (64 KiB)
pub const MAX_RESPONSE_SIZE: usize = 65_536;

/// Default remote store address
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Wire date format (`yyyy-MM-dd`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Punctuation permitted in passwords in addition to letters and digits
pub const PASSWORD_PUNCTUATION: &str = "!#$%&()*+-:;<=>?@[]^_{|}~";

/// Punctuation permitted in event labels in addition to letters and digits
pub const LABEL_PUNCTUATION: &str = " :-_";

/// Bulk list delimiters
pub const RECORD_SEPARATOR: char = ';';
pub const FIELD_SEPARATOR: char = ',';
pub const TOKEN_SEPARATOR: char = ' ';
