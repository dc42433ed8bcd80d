macro_rules! def_units {
    ($t: ident, $doc: literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Eq, PartialEq)]
        pub struct $t<T>(pub T);

        impl<T> $t<T> {
            pub fn into_inner(self) -> T {
                self.0
            }

            pub fn map<S>(self, mut f: impl FnMut(T) -> S) -> $t<S> {
                $t(f(self.0))
            }
        }
    };
}

def_units!(
    VoxelUnits,
    "Denotes that the inner `T` is given in grid space, where the voxel with key `k` spans `[k, k + 1)`."
);
def_units!(MetricUnits, "Denotes that the inner `T` is given in meters.");
