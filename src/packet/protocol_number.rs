use serde::{Deserialize, Serialize};
use std::fmt;

// IANAのプロトコル番号
// https://www.iana.org/assignments/protocol-numbers/protocol-numbers.xhtml
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolNumber(pub u8);

impl ProtocolNumber {
    pub const TCP: ProtocolNumber = ProtocolNumber(6);
    pub const UDP: ProtocolNumber = ProtocolNumber(17);

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<ProtocolNumber> for u8 {
    fn from(protocol: ProtocolNumber) -> Self {
        protocol.0
    }
}

// フローIDにはそのまま10進数で埋め込まれる
impl fmt::Display for ProtocolNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
