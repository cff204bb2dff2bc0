use std::convert::Infallible;

use nalgebra::{vector, Vector3};

use crate::StreamCodec;

impl StreamCodec for Vector3<f32> {
    type ReadError = crate::ReadError;
    type WriteError = Infallible;

    fn read_from(r: &mut &[u8]) -> Result<Self, crate::ReadError> {
        let x = f32::read_from(r)?;
        let y = f32::read_from(r)?;
        let z = f32::read_from(r)?;
        Ok(vector![x, y, z])
    }

    fn write_to(&self, w: &mut Vec<u8>) -> Result<(), Infallible> {
        self.x.write_to(w)?;
        self.y.write_to(w)?;
        self.z.write_to(w)?;
        Ok(())
    }
}
