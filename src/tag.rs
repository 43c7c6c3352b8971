use std::fmt;

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ValueKind {
    Null = 0,
    Bool = 1,
    Int = 2,
    UInt = 3,
    Float = 4,
    String = 5,
    Struct = 6,
    Array = 7,
}

impl ValueKind {
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Int | Self::UInt | Self::Float | Self::String
        )
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::UInt | Self::Float)
    }

    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Struct | Self::Array)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "signed integer",
            Self::UInt => "unsigned integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Struct => "struct",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
