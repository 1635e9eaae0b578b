use std::fmt;
use std::path::PathBuf;

use quote::{format_ident, quote};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MetricDefinition {
    /// The key for the metric.
    name: String,
    /// The unit for the metric.
    /// Units follow the UCUM (The Unified Code for Units of Measure) standard
    /// used by the OpenTelemetry semantic conventions.
    ///
    /// See also: <https://opentelemetry.io/docs/specs/semconv/general/metrics/#units>
    unit: MetricUnit,
    /// The metric description.
    description: String,
    /// The metric type.
    r#type: MetricType,
    /// The metric value type.
    value_type: MetricValueType,
    /// The allowed attributes associated with the metric.
    attributes: Vec<AttributeName>,
}

impl MetricDefinition {
    fn field_name(&self) -> String {
        self.name.replace('.', "_")
    }
}

/// The units supported in the instrument registry.
/// Client-side latencies are reported in milliseconds and counts are dimensionless.
#[derive(Deserialize)]
enum MetricUnit {
    #[serde(rename = "ms")]
    Millisecond,
    #[serde(rename = "1")]
    Dimensionless,
}

impl fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricUnit::Millisecond => write!(f, "ms"),
            MetricUnit::Dimensionless => write!(f, "1"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
enum MetricType {
    Counter,
    Histogram,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MetricValueType {
    U64,
    F64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MetricAttribute {
    /// The key for the attribute.
    name: AttributeName,
    /// The attribute description.
    description: String,
}

#[derive(Deserialize)]
struct AttributeName(String);

impl AttributeName {
    fn key(&self) -> String {
        self.0.clone()
    }

    fn constant_name(&self) -> String {
        self.0.replace('.', "_").to_uppercase()
    }
}

fn build_instrument_registry() -> Result<(), Box<dyn std::error::Error>> {
    let path = "src/metrics/data/registry.yaml";
    println!("cargo:rerun-if-changed={path}");

    let content = std::fs::read_to_string(path)?;
    let metrics: Vec<MetricDefinition> = serde_yaml::from_str(&content)?;

    let fields = metrics
        .iter()
        .map(|metric| {
            let description = &metric.description;
            let unit = format!("The unit is `{}`.", metric.unit);
            let field_name = format_ident!("{}", metric.field_name());
            let field_type = match (&metric.r#type, &metric.value_type) {
                (MetricType::Counter, MetricValueType::U64) => {
                    quote! { crate::metrics::Counter<u64> }
                }
                (MetricType::Histogram, MetricValueType::F64) => {
                    quote! { crate::metrics::Histogram<f64> }
                }
                (t, vt) => {
                    return Err(syn::Error::new(
                        proc_macro2::Span::call_site(),
                        format!("invalid metric: {t:?} {vt:?}"),
                    ))
                }
            };
            Ok(quote! {
                #[doc = #description]
                #[doc = ""]
                #[doc = #unit]
                pub #field_name: #field_type,
            })
        })
        .collect::<Result<Vec<_>, syn::Error>>()?;

    let descriptors = metrics
        .iter()
        .map(|metric| {
            let name = &metric.name;
            let unit = metric.unit.to_string();
            let description = &metric.description;
            let kind = match metric.r#type {
                MetricType::Counter => quote! { crate::metrics::InstrumentKind::Counter },
                MetricType::Histogram => quote! { crate::metrics::InstrumentKind::Histogram },
            };
            quote! {
                crate::metrics::InstrumentDescriptor {
                    name: #name,
                    unit: #unit,
                    description: #description,
                    kind: #kind,
                },
            }
        })
        .collect::<Vec<_>>();

    let initializers = metrics
        .iter()
        .enumerate()
        .map(|(index, metric)| {
            let field_name = format_ident!("{}", metric.field_name());
            let index = proc_macro2::Literal::usize_unsuffixed(index);
            let attributes = metric
                .attributes
                .iter()
                .map(|attr| {
                    let constant_name = format_ident!("{}", attr.constant_name());
                    quote! { crate::metrics::MetricAttribute::#constant_name }
                })
                .collect::<Vec<_>>();
            let keys = quote! { std::sync::Arc::from([#(#attributes),*]) };
            let initializer = match (&metric.r#type, &metric.value_type) {
                (MetricType::Counter, MetricValueType::U64) => quote! {
                    #field_name: crate::metrics::Counter::new(
                        Self::DESCRIPTORS[#index],
                        provider.u64_counter(&Self::DESCRIPTORS[#index])?,
                        #keys,
                    ),
                },
                (MetricType::Histogram, MetricValueType::F64) => quote! {
                    #field_name: crate::metrics::Histogram::new(
                        Self::DESCRIPTORS[#index],
                        provider.f64_histogram(&Self::DESCRIPTORS[#index])?,
                        #keys,
                    ),
                },
                (t, vt) => {
                    return Err(syn::Error::new(
                        proc_macro2::Span::call_site(),
                        format!("invalid metric: {t:?} {vt:?}"),
                    ))
                }
            };
            Ok(initializer)
        })
        .collect::<Result<Vec<_>, syn::Error>>()?;

    let tokens = quote! {
        #[doc = "A registry of all the instruments reported by the client."]
        #[doc = ""]
        #[doc = "The registry is not `Clone`. Share it behind an `Arc` instead."]
        pub struct InstrumentRegistry {
            #(#fields)*
        }

        impl InstrumentRegistry {
            #[doc = "The metadata of every instrument in the registry, in declaration order."]
            pub const DESCRIPTORS: &'static [crate::metrics::InstrumentDescriptor] = &[
                #(#descriptors)*
            ];

            #[doc = "Creates every instrument through the given provider."]
            #[doc = "Fails on the first instrument the provider cannot create."]
            pub fn try_new(
                provider: &dyn crate::metrics::InstrumentProvider,
            ) -> crate::error::TelemetryResult<Self> {
                Ok(Self {
                    #(#initializers)*
                })
            }
        }
    };

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    std::fs::write(
        out_dir.join("instrument_registry.rs"),
        prettyplease::unparse(&syn::parse2(tokens)?),
    )?;
    Ok(())
}

fn build_metric_attributes() -> Result<(), Box<dyn std::error::Error>> {
    let path = "src/metrics/data/attributes.yaml";
    println!("cargo:rerun-if-changed={path}");

    let content = std::fs::read_to_string(path)?;
    let attrs: Vec<MetricAttribute> = serde_yaml::from_str(&content)?;

    let constants = attrs
        .iter()
        .map(|attr| {
            let description = &attr.description;
            let key = &attr.name.key();
            let constant_name = format_ident!("{}", &attr.name.constant_name());
            quote! {
                #[doc = #description]
                pub const #constant_name: &str = #key;
            }
        })
        .collect::<Vec<_>>();

    let tokens = quote! {
        #[doc = "Common metric attribute names."]
        pub struct MetricAttribute;

        impl MetricAttribute {
            #(#constants)*
        }
    };

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    std::fs::write(
        out_dir.join("metric_attributes.rs"),
        prettyplease::unparse(&syn::parse2(tokens)?),
    )?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    build_instrument_registry()?;
    build_metric_attributes()?;
    Ok(())
}
