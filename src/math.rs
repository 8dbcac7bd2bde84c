// math.rs: Small linear algebra kit for the tracer. Everything is f32 and Copy.

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec3 {
    pub x : f32,
    pub y : f32,
    pub z : f32
}

#[macro_export]
macro_rules! vec3 {
    ($x: expr, $y: expr, $z: expr ) => {
        $crate::math::Vec3 { x: $x, y: $y, z: $z }
    };
    ($v: expr) => {
        $crate::math::Vec3 { x: $v, y: $v, z: $v }
    };
}

macro_rules! element_wise_binary_op {
    ($op: tt, $trait: ident, $func: ident) => {
        impl std::ops::$trait<Vec3> for Vec3 {
            type Output = Vec3;

            fn $func(self, rhs: Vec3) -> Vec3 {
                Vec3 {
                    x: self.x $op rhs.x,
                    y: self.y $op rhs.y,
                    z: self.z $op rhs.z,
                }
            }
        }

        impl std::ops::$trait<f32> for Vec3 {
            type Output = Vec3;

            fn $func(self, rhs: f32) -> Vec3 {
                Vec3 {
                    x: self.x $op rhs,
                    y: self.y $op rhs,
                    z: self.z $op rhs,
                }
            }
        }

        impl std::ops::$trait<Vec3> for f32 {
            type Output = Vec3;

            fn $func(self, rhs: Vec3) -> Vec3 {
                Vec3 {
                    x: self $op rhs.x,
                    y: self $op rhs.y,
                    z: self $op rhs.z,
                }
            }
        }
    };
}

element_wise_binary_op!(+, Add, add);
element_wise_binary_op!(-, Sub, sub);
element_wise_binary_op!(*, Mul, mul);
element_wise_binary_op!(/, Div, div);

macro_rules! element_wise_binary_op_assign {
    ($op: tt, $trait: ident, $func: ident) => {
        impl std::ops::$trait<Vec3> for Vec3 {
            fn $func(&mut self, rhs: Vec3) {
                self.x $op rhs.x;
                self.y $op rhs.y;
                self.z $op rhs.z;
            }
        }

        impl std::ops::$trait<f32> for Vec3 {
            fn $func(&mut self, rhs: f32) {
                self.x $op rhs;
                self.y $op rhs;
                self.z $op rhs;
            }
        }
    };
}

element_wise_binary_op_assign!(+=, AddAssign, add_assign);
element_wise_binary_op_assign!(-=, SubAssign, sub_assign);
element_wise_binary_op_assign!(*=, MulAssign, mul_assign);
element_wise_binary_op_assign!(/=, DivAssign, div_assign);

impl std::ops::Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3 { x: -self.x, y: -self.y, z: -self.z }
    }
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3 { x, y, z }
    }

    pub const fn zero() -> Vec3 {
        Vec3 { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn length_sq(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn normalized(&self) -> Vec3 {
        let inv_len = 1.0 / self.length();
        Vec3 {x: self.x * inv_len, y: self.y * inv_len, z: self.z * inv_len}
    }

    pub fn dot(&self, b: &Vec3) -> f32 {
        self.x * b.x + self.y * b.y + self.z * b.z
    }

    pub fn cross(&self, b: &Vec3) -> Vec3 {
        let a = self;
        Vec3 {
            x: (a.y * b.z - a.z * b.y),
            y: -(a.x * b.z - a.z * b.x),
            z: (a.x * b.y - a.y * b.x)
        }
    }

    pub fn min(&self, b: &Vec3) -> Vec3 {
        vec3![f32::min(self.x, b.x), f32::min(self.y, b.y), f32::min(self.z, b.z)]
    }

    pub fn max(&self, b: &Vec3) -> Vec3 {
        vec3![f32::max(self.x, b.x), f32::max(self.y, b.y), f32::max(self.z, b.z)]
    }

    /// Component by axis index, 0 = x, 1 = y, anything else = z.
    pub fn at(&self, axis: usize) -> f32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a.dot(&b)
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    a.cross(&b)
}

pub fn length(v: Vec3) -> f32 {
    v.length()
}

pub fn normalized(v: Vec3) -> Vec3 {
    v.normalized()
}

pub fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    (1.0 - t) * a + t * b
}

pub fn clamp(x: f32, min: f32, max: f32) -> f32 {
    if x < min { return min; }
    if x > max { return max; }
    x
}
