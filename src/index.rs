mod private {
    pub trait Sealed {}
    impl Sealed for usize {}
    impl Sealed for i32 {}
    impl Sealed for str {}
    impl Sealed for String {}
    impl Sealed for [i32] {}
    impl<const N: usize> Sealed for [i32; N] {}
    impl Sealed for Vec<i32> {}
    impl<T> Sealed for &T where T: ?Sized + Sealed {}
}

/// Anything that can address a child of a [`Value`](crate::Value): a member
/// name for structs, a native coordinate for arrays.
///
/// Integer indices are one-component coordinates, so they address rank 1
/// arrays in their own (possibly non-zero) index space.
pub trait Index: private::Sealed {
    #[doc(hidden)]
    fn index_dispatch<'a, V, R: Default>(
        &self,
        value: &'a V,
        n: impl FnOnce(&'a V, &[i32]) -> R,
        s: impl FnOnce(&'a V, &str) -> R,
    ) -> R;

    #[doc(hidden)]
    fn index_dispatch_mut<'a, V, R: Default>(
        &self,
        value: &'a mut V,
        n: impl FnOnce(&'a mut V, &[i32]) -> R,
        s: impl FnOnce(&'a mut V, &str) -> R,
    ) -> R;
}

macro_rules! impl_coordinate_index {
    ($($t:ty => |$this:ident| $coordinate:expr;)*) => {$(
        impl Index for $t {
            #[inline]
            fn index_dispatch<'a, V, R: Default>(
                &self,
                value: &'a V,
                n: impl FnOnce(&'a V, &[i32]) -> R,
                _: impl FnOnce(&'a V, &str) -> R,
            ) -> R {
                let $this = self;
                n(value, $coordinate)
            }

            #[inline]
            fn index_dispatch_mut<'a, V, R: Default>(
                &self,
                value: &'a mut V,
                n: impl FnOnce(&'a mut V, &[i32]) -> R,
                _: impl FnOnce(&'a mut V, &str) -> R,
            ) -> R {
                let $this = self;
                n(value, $coordinate)
            }
        }
    )*};
}

impl_coordinate_index! {
    i32 => |this| &[*this];
    [i32] => |this| this;
    Vec<i32> => |this| this.as_slice();
}

impl<const N: usize> Index for [i32; N] {
    #[inline]
    fn index_dispatch<'a, V, R: Default>(
        &self,
        value: &'a V,
        n: impl FnOnce(&'a V, &[i32]) -> R,
        _: impl FnOnce(&'a V, &str) -> R,
    ) -> R {
        n(value, self)
    }

    #[inline]
    fn index_dispatch_mut<'a, V, R: Default>(
        &self,
        value: &'a mut V,
        n: impl FnOnce(&'a mut V, &[i32]) -> R,
        _: impl FnOnce(&'a mut V, &str) -> R,
    ) -> R {
        n(value, self)
    }
}

impl Index for usize {
    #[inline]
    fn index_dispatch<'a, V, R: Default>(
        &self,
        value: &'a V,
        n: impl FnOnce(&'a V, &[i32]) -> R,
        _: impl FnOnce(&'a V, &str) -> R,
    ) -> R {
        match i32::try_from(*self) {
            Ok(index) => n(value, &[index]),
            // beyond every i32 coordinate, so no element
            Err(_) => R::default(),
        }
    }

    #[inline]
    fn index_dispatch_mut<'a, V, R: Default>(
        &self,
        value: &'a mut V,
        n: impl FnOnce(&'a mut V, &[i32]) -> R,
        _: impl FnOnce(&'a mut V, &str) -> R,
    ) -> R {
        match i32::try_from(*self) {
            Ok(index) => n(value, &[index]),
            Err(_) => R::default(),
        }
    }
}

impl Index for str {
    #[inline]
    fn index_dispatch<'a, V, R: Default>(
        &self,
        value: &'a V,
        _: impl FnOnce(&'a V, &[i32]) -> R,
        s: impl FnOnce(&'a V, &str) -> R,
    ) -> R {
        s(value, self)
    }

    #[inline]
    fn index_dispatch_mut<'a, V, R: Default>(
        &self,
        value: &'a mut V,
        _: impl FnOnce(&'a mut V, &[i32]) -> R,
        s: impl FnOnce(&'a mut V, &str) -> R,
    ) -> R {
        s(value, self)
    }
}

impl Index for String {
    #[inline]
    fn index_dispatch<'a, V, R: Default>(
        &self,
        value: &'a V,
        _: impl FnOnce(&'a V, &[i32]) -> R,
        s: impl FnOnce(&'a V, &str) -> R,
    ) -> R {
        s(value, self.as_str())
    }

    #[inline]
    fn index_dispatch_mut<'a, V, R: Default>(
        &self,
        value: &'a mut V,
        _: impl FnOnce(&'a mut V, &[i32]) -> R,
        s: impl FnOnce(&'a mut V, &str) -> R,
    ) -> R {
        s(value, self.as_str())
    }
}

impl<T: ?Sized + Index> Index for &T {
    #[inline]
    fn index_dispatch<'a, V, R: Default>(
        &self,
        value: &'a V,
        n: impl FnOnce(&'a V, &[i32]) -> R,
        s: impl FnOnce(&'a V, &str) -> R,
    ) -> R {
        (**self).index_dispatch(value, n, s)
    }

    #[inline]
    fn index_dispatch_mut<'a, V, R: Default>(
        &self,
        value: &'a mut V,
        n: impl FnOnce(&'a mut V, &[i32]) -> R,
        s: impl FnOnce(&'a mut V, &str) -> R,
    ) -> R {
        (**self).index_dispatch_mut(value, n, s)
    }
}
