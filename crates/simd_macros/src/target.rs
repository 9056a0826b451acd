// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

/// A named feature level. Kernels are compiled once per level they list.
pub struct TargetCpu {
    pub name: &'static str,
    pub arch: &'static str,
    pub features: &'static [&'static str],
}

pub const TARGET_CPUS: &[TargetCpu] = &[
    // x86-64-v4 without avx512f16: 16 f32 lanes, masked loads
    TargetCpu {
        name: "v4",
        arch: "x86_64",
        features: &[
            "avx512f", "avx512bw", "avx512cd", "avx512dq", "avx512vl", // simd
            "bmi1", "bmi2", "lzcnt", "movbe", "popcnt", // bit-operations
        ],
    },
    // x86-64-v3: 8 f32 lanes, f16c conversion, fma
    TargetCpu {
        name: "v3",
        arch: "x86_64",
        features: &[
            "avx", "avx2", "f16c", "fma", // simd
            "bmi1", "bmi2", "lzcnt", "movbe", "popcnt", // bit-operations
        ],
    },
    // x86-64-v2: 4 f32 lanes, no fma
    TargetCpu {
        name: "v2",
        arch: "x86_64",
        features: &[
            "sse4.1", "sse4.2", // simd
            "popcnt", // bit-operations
        ],
    },
    TargetCpu {
        name: "a2",
        arch: "aarch64",
        features: &[
            "neon", // simd
        ],
    },
];

pub fn find(name: &str) -> Option<&'static TargetCpu> {
    TARGET_CPUS
        .iter()
        .find(|target_cpu| target_cpu.name == name)
}
