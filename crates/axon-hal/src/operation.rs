//! Operations: graph nodes consuming and producing operands.

use crate::version::HalVersion;

/// Numeric tags at or above this value denote vendor extension operations.
pub const EXTENSION_OPERATION_BASE: i32 = 0x10000;

macro_rules! operation_types {
    ($(($variant:ident, $code:expr, $version:ident)),* $(,)?) => {
        /// The operation repertoire, tagged with wire-visible numeric codes.
        ///
        /// Each operation carries an implicit introduction version; a model
        /// declared at an earlier HAL version must not use it.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum OperationType {
            $($variant,)*
            Extension(i32),
        }

        impl OperationType {
            /// The wire-visible numeric tag of this operation.
            pub fn code(self) -> i32 {
                match self {
                    $(OperationType::$variant => $code,)*
                    OperationType::Extension(code) => code,
                }
            }

            /// Decode a numeric tag. Unknown tags below the extension
            /// threshold yield `None`.
            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(OperationType::$variant),)*
                    c if c >= EXTENSION_OPERATION_BASE => Some(OperationType::Extension(c)),
                    _ => None,
                }
            }

            /// The HAL version that introduced this operation.
            pub fn min_version(self) -> HalVersion {
                match self {
                    $(OperationType::$variant => HalVersion::$version,)*
                    OperationType::Extension(_) => HalVersion::V1_2,
                }
            }
        }
    };
}

operation_types! {
    (Add, 0, V1_0),
    (AveragePool2d, 1, V1_0),
    (Concatenation, 2, V1_0),
    (Conv2d, 3, V1_0),
    (DepthwiseConv2d, 4, V1_0),
    (DepthToSpace, 5, V1_0),
    (Dequantize, 6, V1_0),
    (EmbeddingLookup, 7, V1_0),
    (Floor, 8, V1_0),
    (FullyConnected, 9, V1_0),
    (HashtableLookup, 10, V1_0),
    (L2Normalization, 11, V1_0),
    (L2Pool2d, 12, V1_0),
    (LocalResponseNormalization, 13, V1_0),
    (Logistic, 14, V1_0),
    (LshProjection, 15, V1_0),
    (Lstm, 16, V1_0),
    (MaxPool2d, 17, V1_0),
    (Mul, 18, V1_0),
    (Relu, 19, V1_0),
    (Relu1, 20, V1_0),
    (Relu6, 21, V1_0),
    (Reshape, 22, V1_0),
    (ResizeBilinear, 23, V1_0),
    (Rnn, 24, V1_0),
    (Softmax, 25, V1_0),
    (SpaceToDepth, 26, V1_0),
    (Svdf, 27, V1_0),
    (Tanh, 28, V1_0),
    (BatchToSpaceNd, 29, V1_1),
    (Div, 30, V1_1),
    (Mean, 31, V1_1),
    (Pad, 32, V1_1),
    (SpaceToBatchNd, 33, V1_1),
    (Squeeze, 34, V1_1),
    (StridedSlice, 35, V1_1),
    (Sub, 36, V1_1),
    (Transpose, 37, V1_1),
    (Abs, 38, V1_2),
    (Cast, 45, V1_2),
    (Equal, 48, V1_2),
    (Gather, 51, V1_2),
    (Greater, 53, V1_2),
    (Less, 58, V1_2),
    (Maximum, 65, V1_2),
    (Minimum, 66, V1_2),
    (Neg, 67, V1_2),
    (Pow, 70, V1_2),
    (Quantize, 72, V1_2),
    (Select, 84, V1_2),
    (Slice, 86, V1_2),
    (Split, 87, V1_2),
    (Sqrt, 88, V1_2),
    (Tile, 89, V1_2),
    (QuantizedLstm, 95, V1_3),
    (If, 96, V1_3),
    (While, 97, V1_3),
    (Elu, 98, V1_3),
    (HardSwish, 99, V1_3),
    (Fill, 100, V1_3),
    (Rank, 101, V1_3),
    (OemOperation, 10_000, V1_0),
}

/// A graph node: consumes the operands named by `inputs`, produces the ones
/// named by `outputs`. Indices refer to the enclosing subgraph's operand list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub operation_type: OperationType,
    pub inputs: Vec<u32>,
    pub outputs: Vec<u32>,
}

impl Operation {
    pub fn new(operation_type: OperationType, inputs: Vec<u32>, outputs: Vec<u32>) -> Self {
        Self { operation_type, inputs, outputs }
    }
}
