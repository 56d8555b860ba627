//! Register widths and runtime capability selection.
//!
//! The kernel asks a [`CapabilityQuery`] for the set of register widths the
//! running CPU can execute and takes the widest one. The query runs on every
//! call; nothing is cached between calls.

use log::trace;

/// SIMD register width tier, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Width {
    /// No vector registers; one element per operation.
    Scalar,
    /// 128-bit registers (SSE2).
    W128,
    /// 256-bit registers (AVX).
    W256,
    /// 512-bit registers (AVX-512F).
    W512,
}

impl Width {
    /// Vector tiers, widest first.
    pub const VECTOR_TIERS: [Width; 3] = [Width::W512, Width::W256, Width::W128];

    /// Register size in bits (0 for the scalar tier).
    #[inline]
    pub const fn bits(self) -> usize {
        match self {
            Width::Scalar => 0,
            Width::W128 => 128,
            Width::W256 => 256,
            Width::W512 => 512,
        }
    }

    /// Register size in bytes (the size of one `f32` for the scalar tier).
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            Width::Scalar => core::mem::size_of::<f32>(),
            _ => self.bits() / 8,
        }
    }

    /// Number of `f32` lanes in one register.
    #[inline]
    pub const fn lanes(self) -> usize {
        self.bytes() / core::mem::size_of::<f32>()
    }

    const fn bit(self) -> u8 {
        match self {
            Width::Scalar => 0,
            Width::W128 => 1 << 0,
            Width::W256 => 1 << 1,
            Width::W512 => 1 << 2,
        }
    }
}

/// Set of vector widths. The scalar tier is implicit and always available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WidthSet(u8);

impl WidthSet {
    pub const EMPTY: WidthSet = WidthSet(0);

    /// Returns a copy of the set with `width` added.
    #[inline]
    pub const fn with(self, width: Width) -> Self {
        WidthSet(self.0 | width.bit())
    }

    #[inline]
    pub const fn contains(self, width: Width) -> bool {
        match width {
            Width::Scalar => true,
            _ => self.0 & width.bit() != 0,
        }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Drops every width wider than `max`.
    #[inline]
    pub fn at_most(self, max: Width) -> Self {
        Width::VECTOR_TIERS
            .into_iter()
            .filter(|&w| w <= max && self.contains(w))
            .fold(WidthSet::EMPTY, WidthSet::with)
    }

    /// Vector widths in the set, widest first.
    pub fn iter(self) -> impl Iterator<Item = Width> {
        Width::VECTOR_TIERS
            .into_iter()
            .filter(move |&w| self.contains(w))
    }

    /// The widest width in the set, or [`Width::Scalar`] if it is empty.
    #[inline]
    pub fn widest(self) -> Width {
        self.iter().next().unwrap_or(Width::Scalar)
    }
}

impl FromIterator<Width> for WidthSet {
    fn from_iter<I: IntoIterator<Item = Width>>(iter: I) -> Self {
        iter.into_iter().fold(WidthSet::EMPTY, WidthSet::with)
    }
}

/// Source of the register widths the kernel may use.
///
/// # Safety
///
/// Every width returned by `supported_widths` must be executable on the
/// current CPU, and a reported width implies every narrower vector width is
/// executable too. The kernel issues the matching instructions without any
/// further check.
pub unsafe trait CapabilityQuery {
    fn supported_widths(&self) -> WidthSet;
}

/// Runtime detection of the host CPU's vector extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostCapabilities;

// SAFETY: widths come straight from CPUID via `is_x86_feature_detected!`.
unsafe impl CapabilityQuery for HostCapabilities {
    #[inline]
    fn supported_widths(&self) -> WidthSet {
        detect_host_widths()
    }
}

/// Host capabilities limited to widths no wider than `max`.
///
/// Used to force a narrower tier, for example to exercise the 128-bit code
/// path on an AVX-512 machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CappedCapabilities<Q = HostCapabilities> {
    inner: Q,
    max: Width,
}

impl CappedCapabilities<HostCapabilities> {
    #[inline]
    pub const fn new(max: Width) -> Self {
        Self {
            inner: HostCapabilities,
            max,
        }
    }
}

impl<Q: CapabilityQuery> CappedCapabilities<Q> {
    #[inline]
    pub const fn wrap(inner: Q, max: Width) -> Self {
        Self { inner, max }
    }

    #[inline]
    pub const fn max(&self) -> Width {
        self.max
    }
}

// SAFETY: the result is a subset of what `inner` reports, and dropping the
// widest entries keeps the "narrower widths are executable" guarantee.
unsafe impl<Q: CapabilityQuery> CapabilityQuery for CappedCapabilities<Q> {
    #[inline]
    fn supported_widths(&self) -> WidthSet {
        self.inner.supported_widths().at_most(self.max)
    }
}

/// Queries CPU feature flags, widest first.
pub fn detect_host_widths() -> WidthSet {
    #[cfg(target_arch = "x86_64")]
    {
        let mut set = WidthSet::EMPTY;
        if std::is_x86_feature_detected!("avx512f") {
            set = set.with(Width::W512);
        }
        if std::is_x86_feature_detected!("avx") {
            set = set.with(Width::W256);
        }
        if std::is_x86_feature_detected!("sse2") {
            set = set.with(Width::W128);
        }
        trace!("host vector widths: {:?}", set);
        set
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        trace!("no vector tiers on this target");
        WidthSet::EMPTY
    }
}

/// Picks the widest width reported by `query`.
#[inline]
pub fn select_width<Q: CapabilityQuery + ?Sized>(query: &Q) -> Width {
    let width = query.supported_widths().widest();
    trace!("selected {:?} tier ({} lanes)", width, width.lanes());
    width
}
