use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of staff invite tokens.
pub const INVITE_TOKEN_LEN: usize = 48;

/// 生成指定长度的随机字母数字串
pub fn generate_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn generate_invite_token() -> String {
    generate_token(INVITE_TOKEN_LEN)
}

/// Nonce for signed payment provider requests.
pub fn generate_nonce() -> String {
    generate_token(80)
}
