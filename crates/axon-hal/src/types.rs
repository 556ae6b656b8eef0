//! Operand element types and the versioned type registry.
//!
//! The registry answers three questions about an [`OperandType`]: at which HAL
//! version it was introduced, whether it is legal at a given version, and how
//! many bytes a value of that type occupies.

use crate::version::HalVersion;

/// Numeric tags at or above this value denote vendor extension types.
pub const EXTENSION_TYPE_BASE: u32 = 0x10000;

macro_rules! operand_types {
    ($(($variant:ident, $code:expr, $version:ident)),* $(,)?) => {
        /// Element type of an operand.
        ///
        /// Scalar types describe single values, tensor types describe
        /// multi-dimensional arrays. `Extension` carries the opaque numeric
        /// tag of a vendor extension type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum OperandType {
            $($variant,)*
            Extension(u32),
        }

        impl OperandType {
            /// The wire-visible numeric tag of this type.
            pub fn code(self) -> u32 {
                match self {
                    $(OperandType::$variant => $code,)*
                    OperandType::Extension(code) => code,
                }
            }

            /// Decode a numeric tag. Unknown tags below the extension
            /// threshold yield `None`.
            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(OperandType::$variant),)*
                    c if c >= EXTENSION_TYPE_BASE => Some(OperandType::Extension(c)),
                    _ => None,
                }
            }

            /// The HAL version that introduced this type.
            pub fn min_version(self) -> HalVersion {
                match self {
                    $(OperandType::$variant => HalVersion::$version,)*
                    OperandType::Extension(_) => HalVersion::V1_2,
                }
            }
        }
    };
}

operand_types! {
    (Float32, 0, V1_0),
    (Int32, 1, V1_0),
    (Uint32, 2, V1_0),
    (TensorFloat32, 3, V1_0),
    (TensorInt32, 4, V1_0),
    (TensorQuant8Asymm, 5, V1_0),
    (Bool, 6, V1_2),
    (TensorQuant16Symm, 7, V1_2),
    (TensorFloat16, 8, V1_2),
    (TensorBool8, 9, V1_2),
    (Float16, 10, V1_2),
    (TensorQuant8SymmPerChannel, 11, V1_2),
    (TensorQuant16Asymm, 12, V1_2),
    (TensorQuant8Symm, 13, V1_2),
    (TensorQuant8AsymmSigned, 14, V1_3),
    (Subgraph, 15, V1_3),
    (Oem, 10_000, V1_0),
    (TensorOemByte, 10_001, V1_0),
}

impl OperandType {
    /// Whether this is a vendor extension type.
    pub fn is_extension(self) -> bool {
        matches!(self, OperandType::Extension(_))
    }

    /// Whether this is an OEM escape-hatch type.
    pub fn is_oem(self) -> bool {
        matches!(self, OperandType::Oem | OperandType::TensorOemByte)
    }

    /// Whether values of this type are single scalars (rank 0).
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            OperandType::Float16
                | OperandType::Float32
                | OperandType::Int32
                | OperandType::Uint32
                | OperandType::Bool
                | OperandType::Subgraph
                | OperandType::Oem
        )
    }

    /// Whether values of this type are tensors (rank >= 1).
    pub fn is_tensor(self) -> bool {
        matches!(
            self,
            OperandType::TensorFloat16
                | OperandType::TensorFloat32
                | OperandType::TensorInt32
                | OperandType::TensorBool8
                | OperandType::TensorQuant8Asymm
                | OperandType::TensorQuant8AsymmSigned
                | OperandType::TensorQuant8Symm
                | OperandType::TensorQuant16Asymm
                | OperandType::TensorQuant16Symm
                | OperandType::TensorQuant8SymmPerChannel
                | OperandType::TensorOemByte
        )
    }

    /// Whether this type is part of the repertoire of the given HAL version.
    pub fn is_valid_at(self, version: HalVersion) -> bool {
        self.min_version() <= version
    }

    /// Size in bytes of one element, for non-extension, non-OEM types.
    pub fn size_of_element(self) -> Option<u64> {
        let size = match self {
            OperandType::Float16 | OperandType::TensorFloat16 => 2,
            OperandType::Float32 | OperandType::TensorFloat32 => 4,
            OperandType::Int32 | OperandType::TensorInt32 => 4,
            OperandType::Uint32 => 4,
            OperandType::Bool | OperandType::TensorBool8 => 1,
            OperandType::TensorQuant8Asymm
            | OperandType::TensorQuant8AsymmSigned
            | OperandType::TensorQuant8Symm
            | OperandType::TensorQuant8SymmPerChannel => 1,
            OperandType::TensorQuant16Asymm | OperandType::TensorQuant16Symm => 2,
            OperandType::Subgraph => 4,
            OperandType::Oem | OperandType::TensorOemByte | OperandType::Extension(_) => {
                return None;
            }
        };
        Some(size)
    }

    /// Byte size of a value with the given dimensions, for non-extension,
    /// non-OEM types. Scalars have an empty dimension list and occupy one
    /// element.
    pub fn size_of_data(self, dimensions: &[u32]) -> Option<u64> {
        let element = self.size_of_element()?;
        let count = dimensions.iter().map(|&d| u64::from(d)).product::<u64>();
        Some(element * count)
    }
}
