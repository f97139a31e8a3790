//! Wire constants shared with the invoking shell and the preference store.

/// Action tag that requests a decrypt screen for a single password file.
pub const ACTION_DECRYPT_PASS: &str = "DECRYPT_PASS";

/// Extra carrying the absolute path of the encrypted file.
pub const EXTRA_FILE_PATH: &str = "FILE_PATH";

/// Extra carrying the root of the password repository.
pub const EXTRA_REPO_PATH: &str = "REPO_PATH";

/// Boolean preference that turns biometric gating on. Absent means off.
pub const BIOMETRIC_AUTH: &str = "biometric_auth";
