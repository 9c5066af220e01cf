pub type NumericData = f64;
pub type Point = (NumericData, NumericData);
